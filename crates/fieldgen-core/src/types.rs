//! The declared-type vocabulary of the record system.
//!
//! Every field may declare a type by [`TypeId`]. The declared type is what
//! type-driven inference works from when a field has neither an explicit
//! generation source nor a default: scalars, text, fixed-size arrays,
//! optionals, enums/tagged unions and nested records.
//!
//! Enums use [`IndexMap`] for insertion-ordered variants.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::record::RecordDef;
use crate::type_id::TypeId;

/// A type known to the registry. Each variant represents a distinct kind of type.
#[derive(Debug, Clone)]
pub enum DeclaredType {
    /// Scalar primitives.
    Scalar(ScalarType),

    /// UTF-8 text.
    Text,

    /// Fixed-size array: `[T; N]`.
    Array { element: TypeId, length: u32 },

    /// A value of the inner type, or nothing.
    Optional(TypeId),

    /// Named enum / tagged union (nominal typing).
    Enum(EnumDef),

    /// Named record with ordered fields and an optional base record.
    Record(RecordDef),

    /// Unit type (zero-size, like Rust's `()`).
    Unit,

    /// Never type (uninhabited, like Rust's `!`).
    Never,

    /// A type the registry can name but has no values to offer for.
    Opaque { name: String },
}

/// Scalar (primitive) types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

/// Named enum (tagged union) definition with insertion-ordered variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    pub variants: IndexMap<String, EnumVariant>,
}

/// A single variant within an enum definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumVariant {
    /// Index of this variant (used as discriminant).
    pub index: u32,
    /// Payload type, if any (`None` = unit variant).
    pub payload: Option<TypeId>,
}

impl EnumDef {
    /// Builds an enum from `(name, payload)` pairs, numbering variants in
    /// the order given.
    pub fn new<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<TypeId>)>,
        S: Into<String>,
    {
        let variants = variants
            .into_iter()
            .enumerate()
            .map(|(index, (name, payload))| {
                (
                    name.into(),
                    EnumVariant {
                        index: index as u32,
                        payload,
                    },
                )
            })
            .collect();
        EnumDef {
            name: name.into(),
            variants,
        }
    }
}

impl DeclaredType {
    /// Short human-readable kind name, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DeclaredType::Scalar(_) => "scalar",
            DeclaredType::Text => "text",
            DeclaredType::Array { .. } => "array",
            DeclaredType::Optional(_) => "optional",
            DeclaredType::Enum(_) => "enum",
            DeclaredType::Record(_) => "record",
            DeclaredType::Unit => "unit",
            DeclaredType::Never => "never",
            DeclaredType::Opaque { .. } => "opaque",
        }
    }
}
