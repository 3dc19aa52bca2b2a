//! Value sources and the field-source declarator.
//!
//! A field's [`ValueSource`] is, in order of precedence: the strategy
//! attached with [`field_from`], a constant wrapping the field's default, or
//! values inferred from its declared type. Attached strategies live in
//! the field's metadata under [`STRATEGY_METADATA_KEY`].

use fieldgen_core::{Attribute, FieldDef, Metadata, TypeId, Value};
use proptest::strategy::{SBoxedStrategy, Strategy};

use crate::infer::Inference;

/// Reserved metadata key under which [`field_from`] stores its strategy.
pub const STRATEGY_METADATA_KEY: &str = "fieldgen.strategy";

/// A strategy attached to a field, producing [`Value`]s.
#[derive(Debug, Clone)]
pub struct FieldStrategy(SBoxedStrategy<Value>);

impl FieldStrategy {
    /// Wraps any strategy whose values convert into [`Value`].
    pub fn new<S>(strategy: S) -> Self
    where
        S: Strategy + Send + Sync + 'static,
        S::Value: Into<Value>,
    {
        FieldStrategy(strategy.prop_map(|v| -> Value { v.into() }).sboxed())
    }

    pub fn strategy(&self) -> &SBoxedStrategy<Value> {
        &self.0
    }
}

/// Where the value of a constructor field comes from.
#[derive(Debug, Clone)]
pub enum ValueSource {
    /// A strategy attached to the field.
    Explicit(SBoxedStrategy<Value>),
    /// The field's default; defaulted fields are never randomized.
    Constant(Value),
    /// Values inferred from the field's declared type.
    Inferred {
        type_id: TypeId,
        inference: Inference,
    },
}

impl ValueSource {

    pub fn kind(&self) -> &'static str {
        match self {
            ValueSource::Explicit(_) => "explicit",
            ValueSource::Constant(_) => "constant",
            ValueSource::Inferred { .. } => "inferred",
        }
    }
}

/// Declares a field drawn from `strategy`. Finish with
/// [`FieldFrom::into_field`].
///
/// ```
/// use fieldgen_core::TypeId;
/// use fieldgen_strategy::field_from;
///
/// let index = field_from(0i64..=10).into_field("index", TypeId::I64);
/// assert!(index.init);
/// assert!(index.default.is_none());
/// ```
pub fn field_from<S>(strategy: S) -> FieldFrom
where
    S: Strategy + Send + Sync + 'static,
    S::Value: Into<Value>,
{
    FieldFrom {
        strategy: FieldStrategy::new(strategy),
        repr: true,
        hash: true,
        compare: true,
        kw_only: false,
        metadata: None,
    }
}

/// Builder returned by [`field_from`].
#[derive(Debug, Clone)]
pub struct FieldFrom {
    strategy: FieldStrategy,
    repr: bool,
    hash: bool,
    compare: bool,
    kw_only: bool,
    metadata: Option<Metadata>,
}

impl FieldFrom {
    /// Whether to include the field in the record's rendering. Default `true`.
    pub fn repr(mut self, repr: bool) -> Self {
        self.repr = repr;
        self
    }

    /// Whether to include the field in hashing. Default `true`.
    pub fn hash(mut self, hash: bool) -> Self {
        self.hash = hash;
        self
    }

    /// Whether to include the field in comparisons. Default `true`.
    pub fn compare(mut self, compare: bool) -> Self {
        self.compare = compare;
        self
    }

    /// Whether the field is keyword-only. Default `false`.
    pub fn kw_only(mut self, kw_only: bool) -> Self {
        self.kw_only = kw_only;
        self
    }

    /// Additional metadata to attach. If it already holds
    /// [`STRATEGY_METADATA_KEY`], a warning is logged and the entry is
    /// overwritten by the attached strategy.
    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Produces the field descriptor.
    pub fn into_field(self, name: impl Into<String>, declared_type: impl Into<Option<TypeId>>) -> FieldDef {
        let name = name.into();
        let mut metadata = self.metadata.unwrap_or_default();
        if metadata.contains_key(STRATEGY_METADATA_KEY) {
            tracing::warn!(
                field = %name,
                key = STRATEGY_METADATA_KEY,
                "strategy metadata key already present in supplied metadata; overwriting"
            );
        }
        metadata.insert(STRATEGY_METADATA_KEY, Attribute::new(self.strategy));

        let mut field = FieldDef::untyped(name).with_metadata(metadata);
        field.declared_type = declared_type.into();
        field.repr = self.repr;
        field.hash = self.hash;
        field.compare = self.compare;
        field.kw_only = self.kw_only;
        field
    }
}
