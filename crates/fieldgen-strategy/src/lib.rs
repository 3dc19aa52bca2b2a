//! Record instance generation on top of `proptest`.
//!
//! Given a record type registered in a [`fieldgen_core::TypeRegistry`], this
//! crate builds a strategy producing instances of it. Each field is drawn
//! from an explicitly attached strategy ([`field_from`]), a constant
//! wrapping its default, or a strategy inferred from its declared type.
//! Records may declare hooks that replace the draw of a field
//! ([`manual_draw`]) or run once a set of fields has been drawn
//! ([`post_draw`]), observing the fields drawn so far through a
//! [`PartialInstance`] and rejecting the attempt if it is unsuitable.

pub mod classify;
pub mod config;
pub mod draw;
pub mod error;
pub mod hooks;
pub mod infer;
pub mod instances;
pub mod partial;
pub mod source;

pub use classify::{classify, drawn_fields, will_draw, Classification};
pub use config::{set_validation_translation, validation_translation_enabled, InstancesConfig};
pub use draw::{runner_from_seed, Drawer};
pub use error::{DrawError, HookError, StrategyError};
pub use hooks::{
    manual_draw, post_draw, resolve, Binding, BoundHook, FieldSet, HookArgs, HookDeclarator,
    HookDescriptor, HookFn, HookKind, HookTables,
};
pub use infer::{infer, Inference, NESTING_LIMIT};
pub use instances::{build_generator, instances, instances_with, Generator, RecordStrategy};
pub use partial::PartialInstance;
pub use source::{field_from, FieldFrom, FieldStrategy, ValueSource, STRATEGY_METADATA_KEY};
