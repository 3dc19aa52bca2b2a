//! Flattening a record's hooks into per-field tables.
//!
//! Hooks are read from the record's namespace merged along its ancestry,
//! base first. A member redeclared under the same name in a subtype
//! replaces the base member; distinct members accumulate. Every manual-draw
//! field must be claimed by at most one surviving member. A post-draw hook
//! is scheduled after whichever of its fields is drawn last.

use std::collections::HashMap;

use fieldgen_core::{RecordDef, TypeId, TypeRegistry, Value};
use indexmap::IndexMap;

use super::declare::HookDescriptor;
use super::HookKind;
use crate::draw::Drawer;
use crate::error::{DrawError, StrategyError};
use crate::partial::PartialInstance;

/// A hook bound to the record type it was resolved for.
#[derive(Debug, Clone)]
pub struct BoundHook {
    member: String,
    owner: TypeId,
    descriptor: HookDescriptor,
}

impl BoundHook {
    /// Name of the namespace member declaring the hook.
    pub fn member(&self) -> &str {
        &self.member
    }

    /// The resolving record type.
    pub fn owner(&self) -> TypeId {
        self.owner
    }

    pub fn descriptor(&self) -> &HookDescriptor {
        &self.descriptor
    }

    pub(crate) fn draw(
        &self,
        owner: &RecordDef,
        drawer: &mut Drawer<'_>,
        field: &str,
        partial: &PartialInstance,
    ) -> Result<Value, DrawError> {
        self.descriptor
            .call_draw(owner, drawer, field, partial)
            .map_err(|err| self.named(err))
    }

    pub(crate) fn check(&self, owner: &RecordDef, partial: &PartialInstance) -> Result<(), DrawError> {
        self.descriptor
            .call_check(owner, partial)
            .map_err(|err| self.named(err))
    }

    fn named(&self, err: DrawError) -> DrawError {
        match err {
            DrawError::Hook { hook, message } if hook.is_empty() => DrawError::Hook {
                hook: self.member.clone(),
                message,
            },
            other => other,
        }
    }
}

/// Resolved hooks of one record type.
#[derive(Debug, Clone, Default)]
pub struct HookTables {
    /// Field name to the hook drawing it.
    pub manual_draw: IndexMap<String, BoundHook>,
    /// Trigger field to the hooks run after it is drawn, in resolution order.
    pub post_draw: IndexMap<String, Vec<BoundHook>>,
}

impl HookTables {
    pub fn manual_for(&self, field: &str) -> Option<&BoundHook> {
        self.manual_draw.get(field)
    }

    pub fn post_for(&self, field: &str) -> &[BoundHook] {
        self.post_draw.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.manual_draw.is_empty() && self.post_draw.is_empty()
    }
}

/// Resolves the hooks of record `id` against its drawn fields.
pub fn resolve(registry: &TypeRegistry, id: TypeId, drawn: &[String]) -> Result<HookTables, StrategyError> {
    let owner = registry.record(id).ok_or_else(|| StrategyError::TypeMismatch {
        name: registry.display_name(id),
    })?;
    let position: HashMap<&str, usize> = drawn
        .iter()
        .enumerate()
        .map(|(i, f)| (f.as_str(), i))
        .collect();
    let invalid = |field: &str, hook: &str| StrategyError::InvalidHookField {
        record: owner.name.clone(),
        field: field.to_string(),
        hook: hook.to_string(),
    };

    let mut tables = HookTables::default();
    for (name, member) in registry.namespace(id)? {
        let Some(descriptor) = member.downcast_ref::<HookDescriptor>() else {
            continue;
        };
        let bound = BoundHook {
            member: name.to_string(),
            owner: id,
            descriptor: descriptor.clone(),
        };

        match descriptor.kind() {
            HookKind::ManualDraw => {
                for field in descriptor.fields().iter() {
                    if !position.contains_key(field) {
                        return Err(invalid(field, name));
                    }
                    if let Some(existing) = tables.manual_draw.get(field) {
                        return Err(StrategyError::DuplicateHookBinding {
                            field: field.to_string(),
                            first: existing.member.clone(),
                            second: name.to_string(),
                        });
                    }
                    tables.manual_draw.insert(field.to_string(), bound.clone());
                }
            }
            HookKind::PostDraw => {
                let mut last = 0;
                for field in descriptor.fields().iter() {
                    let index = *position.get(field).ok_or_else(|| invalid(field, name))?;
                    last = last.max(index);
                }
                tables
                    .post_draw
                    .entry(drawn[last].clone())
                    .or_default()
                    .push(bound);
            }
        }
    }

    tracing::debug!(
        record = %owner.name,
        manual_draw = tables.manual_draw.len(),
        post_draw = tables.post_draw.values().map(Vec::len).sum::<usize>(),
        "resolved record hooks"
    );
    Ok(tables)
}
