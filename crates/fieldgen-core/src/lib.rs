pub mod attr;
pub mod error;
pub mod record;
pub mod type_id;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use attr::Attribute;
pub use error::{CoreError, ValidationError, Violation};
pub use record::{FieldDef, Metadata, RecordDef, RecordInstance, RecordOptions, Validator};
pub use type_id::{TypeId, TypeRegistry};
pub use types::{DeclaredType, EnumDef, EnumVariant, ScalarType};
pub use value::Value;
