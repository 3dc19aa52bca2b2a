//! Error types for strategy construction and individual draw attempts.
//!
//! [`StrategyError`] and [`HookError`] describe mistakes in a record's
//! declaration; they are fatal to building a strategy. [`DrawError`] ends a
//! single generation attempt: either a rejection, which the engine retries,
//! or a failure that propagates to the caller.

use fieldgen_core::{CoreError, TypeId, ValidationError};
use proptest::test_runner::Reason;

/// Structural errors raised while classifying a record or resolving its hooks.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StrategyError {
    /// The target type is not a record.
    #[error("'{name}' was not a record type.")]
    TypeMismatch { name: String },

    /// No value source can be determined for a constructor field.
    #[error("cannot resolve a value source for field '{field}' of '{record}': {reason}")]
    SourceResolution {
        record: String,
        field: String,
        reason: String,
    },

    /// Two surviving manual-draw hooks claim the same field.
    #[error(
        "The field '{field}' is referenced by multiple manual-draw hooks ('{first}' and '{second}')."
    )]
    DuplicateHookBinding {
        field: String,
        first: String,
        second: String,
    },

    /// A hook names a field that is not drawn for the resolving record.
    #[error("Not a valid (drawn) field of '{record}': '{field}' (hook '{hook}').")]
    InvalidHookField {
        record: String,
        field: String,
        hook: String,
    },

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Errors raised synchronously when a hook is declared.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HookError {
    /// The declarator was given no field names.
    #[error("'field' was not a str. Perhaps you forgot to specify the field name?")]
    Usage,

    /// The wrapped function is bound to instances rather than the type.
    #[error("The wrapped function was not a static or per-type function.")]
    NotTypeLevel,

    /// The wrapped function's parameter count does not fit the hook kind.
    #[error(
        "The wrapped function does not have the expected number of parameters. Expected {expected}, got {got}."
    )]
    Arity { expected: usize, got: usize },
}

/// Outcome of a failed generation attempt.
#[derive(Debug, thiserror::Error)]
pub enum DrawError {
    /// The attempt was abandoned; the engine draws again.
    #[error("rejected: {}", .0.message())]
    Rejected(Reason),

    /// The record's validators failed and translation was disabled.
    #[error(transparent)]
    Validation(ValidationError),

    /// Record construction failed for a reason other than validation.
    #[error(transparent)]
    Construct(CoreError),

    /// A hook read a field that has not been drawn yet.
    #[error("field '{field}' has not been drawn")]
    NotDrawn { field: String },

    /// A nested record was drawn by a drawer without generation plans,
    /// one created outside a generator.
    #[error("no generation plan for nested record {id}")]
    Unplanned { id: TypeId },

    /// A hook failed or returned something unusable.
    #[error("hook '{hook}' failed: {message}")]
    Hook { hook: String, message: String },
}

impl DrawError {
    /// Returns `true` for rejections, which are retried rather than reported.
    pub fn is_rejection(&self) -> bool {
        matches!(self, DrawError::Rejected(_))
    }
}

impl From<Reason> for DrawError {
    fn from(reason: Reason) -> Self {
        DrawError::Rejected(reason)
    }
}
