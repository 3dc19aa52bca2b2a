//! Read-only view over the fields drawn so far in one generation attempt.

use fieldgen_core::Value;
use indexmap::IndexMap;

use crate::error::DrawError;

/// The fields drawn so far, in draw order.
///
/// A fresh snapshot is built for every hook invocation; it never contains a
/// field that has not been drawn yet at that point of the attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialInstance {
    values: IndexMap<String, Value>,
}

impl PartialInstance {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_map(values: &IndexMap<String, Value>) -> Self {
        PartialInstance {
            values: values.clone(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Returns `true` if `field` has been drawn.
    pub fn has(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Like [`get`](Self::get), but a missing field is a [`DrawError::NotDrawn`].
    pub fn field(&self, field: &str) -> Result<&Value, DrawError> {
        self.values.get(field).ok_or_else(|| DrawError::NotDrawn {
            field: field.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for PartialInstance {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        PartialInstance {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
