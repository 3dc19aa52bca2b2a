//! Runtime value representation.
//!
//! [`Value`] is the dynamic runtime counterpart to the static declared-type
//! vocabulary. Every field value drawn for a record, every default and every
//! constructed nested record is a `Value`.

use serde::{Deserialize, Serialize};

use crate::record::RecordInstance;
use crate::type_id::TypeId;

/// A runtime value stored in a record field.
///
/// Maps to the declared types:
/// - Scalars: `Bool`, `I8`-`I64`, `F32`, `F64`
/// - `Text`, `Unit`
/// - Compound: `Array`, `Optional`, `Enum`, `Record`
#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Text(String),
    Unit,
    Array(Vec<Value>),
    Optional(Option<Box<Value>>),
    Enum {
        variant: u32,
        payload: Option<Box<Value>>,
    },
    Record(Box<RecordInstance>),
}

impl Value {
    /// Returns the [`TypeId`] of this value for builtin types.
    ///
    /// Compound values carry no static type id without the registry, so
    /// `None` is returned for them.
    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            Value::Bool(_) => Some(TypeId::BOOL),
            Value::I8(_) => Some(TypeId::I8),
            Value::I16(_) => Some(TypeId::I16),
            Value::I32(_) => Some(TypeId::I32),
            Value::I64(_) => Some(TypeId::I64),
            Value::F32(_) => Some(TypeId::F32),
            Value::F64(_) => Some(TypeId::F64),
            Value::Text(_) => Some(TypeId::TEXT),
            Value::Unit => Some(TypeId::UNIT),
            Value::Record(r) => Some(r.type_id()),
            Value::Array(_) | Value::Optional(_) | Value::Enum { .. } => None,
        }
    }

    /// Returns a human-readable description of the value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "Bool",
            Value::I8(_) => "I8",
            Value::I16(_) => "I16",
            Value::I32(_) => "I32",
            Value::I64(_) => "I64",
            Value::F32(_) => "F32",
            Value::F64(_) => "F64",
            Value::Text(_) => "Text",
            Value::Unit => "Unit",
            Value::Array(_) => "Array",
            Value::Optional(_) => "Optional",
            Value::Enum { .. } => "Enum",
            Value::Record(_) => "Record",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns any integer variant widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I8(v) => Some(i64::from(*v)),
            Value::I16(v) => Some(i64::from(*v)),
            Value::I32(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns any float variant widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(v) => Some(f64::from(*v)),
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordInstance> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    String => Text,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<RecordInstance> for Value {
    fn from(v: RecordInstance) -> Self {
        Value::Record(Box::new(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        Value::Optional(v.map(|inner| Box::new(inner.into())))
    }
}
