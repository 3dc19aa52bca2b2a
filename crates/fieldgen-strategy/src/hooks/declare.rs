//! Hook functions, their declarators and descriptors.

use std::fmt;
use std::sync::Arc;

use fieldgen_core::{RecordDef, Value};

use super::{Binding, FieldSet, HookKind};
use crate::draw::Drawer;
use crate::error::{DrawError, HookError};
use crate::partial::PartialInstance;

/// Arguments available to a hook body.
///
/// Manual-draw invocations carry a drawer and the field being drawn;
/// post-draw invocations carry the hook's field set.
pub struct HookArgs<'a, 'r> {
    /// The resolving (most-derived) record type.
    pub owner: &'a RecordDef,
    pub drawer: Option<&'a mut Drawer<'r>>,
    pub field: Option<&'a str>,
    pub fields: Option<&'a FieldSet>,
    pub partial: &'a PartialInstance,
}

impl<'a, 'r> HookArgs<'a, 'r> {
    pub fn manual_draw(
        owner: &'a RecordDef,
        drawer: &'a mut Drawer<'r>,
        field: &'a str,
        partial: &'a PartialInstance,
    ) -> Self {
        HookArgs {
            owner,
            drawer: Some(drawer),
            field: Some(field),
            fields: None,
            partial,
        }
    }

    pub fn post_draw(owner: &'a RecordDef, fields: &'a FieldSet, partial: &'a PartialInstance) -> Self {
        HookArgs {
            owner,
            drawer: None,
            field: None,
            fields: Some(fields),
            partial,
        }
    }

    fn fits(&self, kind: HookKind) -> bool {
        match kind {
            HookKind::ManualDraw => self.drawer.is_some() && self.field.is_some(),
            HookKind::PostDraw => self.fields.is_some(),
        }
    }
}

/// Type-erased hook body. Manual-draw bodies return `Some(value)`.
pub type HookBody =
    Arc<dyn Fn(&mut HookArgs<'_, '_>) -> Result<Option<Value>, DrawError> + Send + Sync>;

fn missing(what: &str) -> DrawError {
    DrawError::Hook {
        hook: String::new(),
        message: format!("invoked without {what}"),
    }
}

/// A function to be wrapped as a hook: its binding, declared parameter
/// count and body.
#[derive(Clone)]
pub struct HookFn {
    binding: Binding,
    params: usize,
    body: HookBody,
}

impl HookFn {
    /// A static manual-draw function `(drawer, field, snapshot)`.
    pub fn draw<F>(f: F) -> Self
    where
        F: Fn(&mut Drawer<'_>, &str, &PartialInstance) -> Result<Value, DrawError>
            + Send
            + Sync
            + 'static,
    {
        HookFn::dynamic(Binding::Static, 3, move |args| {
            let HookArgs {
                drawer,
                field,
                partial,
                ..
            } = args;
            match (drawer.as_deref_mut(), *field) {
                (Some(drawer), Some(field)) => f(drawer, field, *partial).map(Some),
                _ => Err(missing("a drawer and a field name")),
            }
        })
    }

    /// A per-type manual-draw function `(owner, drawer, field, snapshot)`.
    pub fn draw_per_type<F>(f: F) -> Self
    where
        F: Fn(&RecordDef, &mut Drawer<'_>, &str, &PartialInstance) -> Result<Value, DrawError>
            + Send
            + Sync
            + 'static,
    {
        HookFn::dynamic(Binding::PerType, 4, move |args| {
            let HookArgs {
                owner,
                drawer,
                field,
                partial,
                ..
            } = args;
            match (drawer.as_deref_mut(), *field) {
                (Some(drawer), Some(field)) => f(*owner, drawer, field, *partial).map(Some),
                _ => Err(missing("a drawer and a field name")),
            }
        })
    }

    /// A static post-draw function `(fields, snapshot)`.
    pub fn check<F>(f: F) -> Self
    where
        F: Fn(&FieldSet, &PartialInstance) -> Result<(), DrawError> + Send + Sync + 'static,
    {
        HookFn::dynamic(Binding::Static, 2, move |args| match args.fields {
            Some(fields) => f(fields, args.partial).map(|()| None),
            None => Err(missing("a field set")),
        })
    }

    /// A per-type post-draw function `(owner, fields, snapshot)`.
    pub fn check_per_type<F>(f: F) -> Self
    where
        F: Fn(&RecordDef, &FieldSet, &PartialInstance) -> Result<(), DrawError>
            + Send
            + Sync
            + 'static,
    {
        HookFn::dynamic(Binding::PerType, 3, move |args| match args.fields {
            Some(fields) => f(args.owner, fields, args.partial).map(|()| None),
            None => Err(missing("a field set")),
        })
    }

    /// A function taking `params` positional parameters, with its body
    /// working directly on [`HookArgs`].
    pub fn dynamic<F>(binding: Binding, params: usize, body: F) -> Self
    where
        F: Fn(&mut HookArgs<'_, '_>) -> Result<Option<Value>, DrawError> + Send + Sync + 'static,
    {
        HookFn {
            binding,
            params,
            body: Arc::new(body),
        }
    }

    /// An instance-bound function. Declarators reject these.
    pub fn method<F>(params: usize, body: F) -> Self
    where
        F: Fn(&mut HookArgs<'_, '_>) -> Result<Option<Value>, DrawError> + Send + Sync + 'static,
    {
        HookFn::dynamic(Binding::Instance, params, body)
    }

    pub fn binding(&self) -> Binding {
        self.binding
    }

    pub fn params(&self) -> usize {
        self.params
    }
}

impl fmt::Debug for HookFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookFn")
            .field("binding", &self.binding)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A validated field list awaiting the function to wrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookDeclarator {
    kind: HookKind,
    fields: FieldSet,
}

/// Declares a manual-draw hook for `fields`.
///
/// ```
/// use fieldgen_core::Value;
/// use fieldgen_strategy::{manual_draw, HookFn};
///
/// let hook = manual_draw(["value"])
///     .and_then(|d| d.wrap(HookFn::draw(|drawer, _field, _pi| {
///         drawer.draw(&(0i64..=5)).map(Value::I64)
///     })))
///     .unwrap();
/// assert!(hook.fields().contains("value"));
/// ```
pub fn manual_draw<I, S>(fields: I) -> Result<HookDeclarator, HookError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    HookDeclarator::new(HookKind::ManualDraw, fields)
}

/// Declares a post-draw hook depending on `fields`.
pub fn post_draw<I, S>(fields: I) -> Result<HookDeclarator, HookError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    HookDeclarator::new(HookKind::PostDraw, fields)
}

impl HookDeclarator {
    fn new<I, S>(kind: HookKind, fields: I) -> Result<Self, HookError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = FieldSet::new(fields);
        if fields.is_empty() {
            return Err(HookError::Usage);
        }
        Ok(HookDeclarator { kind, fields })
    }

    pub fn kind(&self) -> HookKind {
        self.kind
    }

    /// Wraps `func`, checking that it is type-level and declares the
    /// parameter count this hook kind expects for its binding.
    pub fn wrap(self, func: HookFn) -> Result<HookDescriptor, HookError> {
        let expected = self
            .kind
            .expected_params(func.binding)
            .ok_or(HookError::NotTypeLevel)?;
        if func.params != expected {
            return Err(HookError::Arity {
                expected,
                got: func.params,
            });
        }
        Ok(HookDescriptor {
            kind: self.kind,
            fields: self.fields,
            func,
        })
    }
}

/// A hook ready to be installed as a record namespace member.
#[derive(Clone)]
pub struct HookDescriptor {
    kind: HookKind,
    fields: FieldSet,
    func: HookFn,
}

impl HookDescriptor {
    pub fn kind(&self) -> HookKind {
        self.kind
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn binding(&self) -> Binding {
        self.func.binding
    }

    /// Runs the hook body with `args`, which must match the hook's kind.
    pub fn invoke(&self, args: &mut HookArgs<'_, '_>) -> Result<Option<Value>, DrawError> {
        if !args.fits(self.kind) {
            return Err(missing(match self.kind {
                HookKind::ManualDraw => "a drawer and a field name",
                HookKind::PostDraw => "a field set",
            }));
        }
        (self.func.body)(args)
    }

    /// Calls a manual-draw hook directly, returning the drawn value.
    pub fn call_draw(
        &self,
        owner: &RecordDef,
        drawer: &mut Drawer<'_>,
        field: &str,
        partial: &PartialInstance,
    ) -> Result<Value, DrawError> {
        self.invoke(&mut HookArgs::manual_draw(owner, drawer, field, partial))?
            .ok_or_else(|| DrawError::Hook {
                hook: String::new(),
                message: format!("returned no value for field '{field}'"),
            })
    }

    /// Calls a post-draw hook directly with its own field set.
    pub fn call_check(&self, owner: &RecordDef, partial: &PartialInstance) -> Result<(), DrawError> {
        self.invoke(&mut HookArgs::post_draw(owner, &self.fields, partial))
            .map(|_| ())
    }
}

impl fmt::Debug for HookDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookDescriptor")
            .field("kind", &self.kind)
            .field("fields", &self.fields)
            .field("binding", &self.func.binding)
            .finish()
    }
}
