//! Field hooks: manual draws and post-draw callbacks.
//!
//! A hook is declared with [`manual_draw`] or [`post_draw`], wrapped around a
//! [`HookFn`], and installed as a named namespace member of a record. Both
//! kinds share one declaration path; [`HookKind`] only decides the expected
//! parameter counts and how the resolver schedules the hook.

mod declare;
mod resolve;

use smallvec::SmallVec;

pub use declare::{manual_draw, post_draw, HookArgs, HookBody, HookDeclarator, HookDescriptor, HookFn};
pub use resolve::{resolve, BoundHook, HookTables};

/// The two kinds of hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Replaces the draw of each named field.
    ManualDraw,
    /// Runs once every named field has been drawn.
    PostDraw,
}

impl HookKind {
    /// Parameter count a wrapped function must declare, or `None` if the
    /// binding is not accepted at all.
    pub fn expected_params(self, binding: Binding) -> Option<usize> {
        match (self, binding) {
            (HookKind::ManualDraw, Binding::Static) => Some(3),
            (HookKind::ManualDraw, Binding::PerType) => Some(4),
            (HookKind::PostDraw, Binding::Static) => Some(2),
            (HookKind::PostDraw, Binding::PerType) => Some(3),
            (_, Binding::Instance) => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HookKind::ManualDraw => "manual-draw",
            HookKind::PostDraw => "post-draw",
        }
    }
}

/// How a hook function is bound to its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    /// No access to the record type.
    Static,
    /// Receives the resolving record type as its first argument.
    PerType,
    /// Bound to an instance; never valid for a hook.
    Instance,
}

/// The field names a hook refers to, without duplicates, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet(SmallVec<[String; 4]>);

impl FieldSet {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = SmallVec::new();
        for field in fields {
            let field = field.into();
            if !set.contains(&field) {
                set.push(field);
            }
        }
        FieldSet(set)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|f| f == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
