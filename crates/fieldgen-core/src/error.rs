//! Core error types for fieldgen-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! registration, ancestry lookup and keyword construction of records.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::type_id::TypeId;

/// Core errors produced by the fieldgen-core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// Attempting to register a type name that already exists in the registry.
    #[error("duplicate type name: '{name}'")]
    DuplicateTypeName { name: String },

    /// A TypeId was not found in the type registry.
    #[error("type not found: TypeId({id})", id = id.0)]
    TypeNotFound { id: TypeId },

    /// A TypeId refers to a registered type that is not a record.
    #[error("type {id} is not a record type")]
    NotARecord { id: TypeId },

    /// A record names a base type that is missing or not a record.
    #[error("record '{record}' extends {base}, which is not a registered record")]
    InvalidBase { record: String, base: TypeId },

    /// A field declares a type that is not registered.
    #[error("field '{field}' of record '{record}' declares unknown type {ty}")]
    UnknownFieldType {
        record: String,
        field: String,
        ty: TypeId,
    },

    /// The record options are contradictory.
    #[error("invalid options for record '{record}': {reason}")]
    InvalidOptions { record: String, reason: String },

    /// Construction was given a keyword that is not an init field.
    #[error("{record}() got an unexpected keyword argument '{field}'")]
    UnexpectedArgument { record: String, field: String },

    /// Construction was missing an init field without a default.
    #[error("{record}() missing required argument '{field}'")]
    MissingArgument { record: String, field: String },

    /// A record validator rejected the constructed values.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A single failed check reported by a record validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// The offending field, if the check was field-specific.
    pub field: Option<String>,
    /// Human-readable description.
    pub message: String,
}

impl Violation {
    pub fn new(message: impl Into<String>) -> Self {
        Violation {
            field: None,
            message: message.into(),
        }
    }

    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Violation {
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

/// The structured failure raised by record construction when one or more
/// validators reject the values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub struct ValidationError {
    /// Name of the record whose validators failed.
    pub record: String,
    /// Every violation reported, in validator order.
    pub violations: Vec<Violation>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.violations.len();
        write!(
            f,
            "{n} validation error{} for {}",
            if n == 1 { "" } else { "s" },
            self.record
        )?;
        for v in &self.violations {
            match &v.field {
                Some(field) => write!(f, "\n  {field}: {}", v.message)?,
                None => write!(f, "\n  {}", v.message)?,
            }
        }
        Ok(())
    }
}
