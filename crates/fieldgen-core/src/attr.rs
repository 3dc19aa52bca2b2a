//! Type-erased attribute values.
//!
//! Field metadata and record namespace members are open mappings whose
//! values are owned by whoever put them there. [`Attribute`] stores such a
//! value behind an `Arc<dyn Any>` so the record system can carry it without
//! knowing its type; consumers recover it with [`Attribute::downcast_ref`].

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// A cheaply clonable, type-erased value attached to a field or record.
#[derive(Clone)]
pub struct Attribute {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Attribute {
    /// Wraps `value` as an attribute.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Attribute {
            value: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Returns the wrapped value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Returns `true` if the wrapped value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// The Rust type name of the wrapped value, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if both attributes share the same allocation.
    pub fn ptr_eq(&self, other: &Attribute) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Attribute<{}>", self.type_name)
    }
}
