//! Field classification: which fields are drawn, and from what source.

use fieldgen_core::{FieldDef, TypeId, TypeRegistry};
use indexmap::IndexMap;

use crate::error::StrategyError;
use crate::infer::infer;
use crate::source::{FieldStrategy, ValueSource, STRATEGY_METADATA_KEY};

/// Returns `true` if `field` is drawn: it is a constructor parameter and
/// has no default.
pub fn will_draw(field: &FieldDef) -> bool {
    field.init && field.default.is_none()
}

/// Names of the fields of record `id` that are drawn, in declaration order.
pub fn drawn_fields(registry: &TypeRegistry, id: TypeId) -> Result<Vec<String>, StrategyError> {
    let fields = record_fields(registry, id)?;
    Ok(fields
        .values()
        .filter(|f| will_draw(f))
        .map(|f| f.name.clone())
        .collect())
}

/// The drawn fields of a record and the value source of every constructor
/// field.
#[derive(Debug, Clone)]
pub struct Classification {
    pub drawn: Vec<String>,
    pub sources: IndexMap<String, ValueSource>,
}

/// Classifies the fields of record `id`.
pub fn classify(registry: &TypeRegistry, id: TypeId) -> Result<Classification, StrategyError> {
    let fields = record_fields(registry, id)?;
    let record = registry.display_name(id);

    let mut drawn = Vec::new();
    let mut sources = IndexMap::new();
    for field in fields.values().filter(|f| f.init) {
        let source = source_for(registry, &record, field)?;
        if will_draw(field) {
            drawn.push(field.name.clone());
        }
        sources.insert(field.name.clone(), source);
    }

    tracing::debug!(
        record = %record,
        drawn = ?drawn,
        sources = sources.len(),
        "classified record fields"
    );
    Ok(Classification { drawn, sources })
}

fn record_fields(
    registry: &TypeRegistry,
    id: TypeId,
) -> Result<IndexMap<&str, &FieldDef>, StrategyError> {
    if !registry.is_record(id) {
        return Err(StrategyError::TypeMismatch {
            name: registry.display_name(id),
        });
    }
    Ok(registry.fields(id)?)
}

fn source_for(registry: &TypeRegistry, record: &str, field: &FieldDef) -> Result<ValueSource, StrategyError> {
    let unresolved = |reason: String| StrategyError::SourceResolution {
        record: record.to_string(),
        field: field.name.clone(),
        reason,
    };

    if let Some(attached) = field.metadata.get(STRATEGY_METADATA_KEY) {
        return match attached.downcast_ref::<FieldStrategy>() {
            Some(strategy) => Ok(ValueSource::Explicit(strategy.strategy().clone())),
            None => Err(unresolved(format!(
                "Invalid object {attached:?} found where a strategy was expected."
            ))),
        };
    }
    if let Some(default) = &field.default {
        return Ok(ValueSource::Constant(default.clone()));
    }
    let ty = field
        .declared_type
        .ok_or_else(|| unresolved("no strategy, default or declared type".to_string()))?;
    let inference = infer(registry, ty).map_err(unresolved)?;
    Ok(ValueSource::Inferred {
        type_id: ty,
        inference,
    })
}
