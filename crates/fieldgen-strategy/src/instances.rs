//! The draw orchestrator and its `proptest` strategy adapter.
//!
//! [`build_generator`] classifies a record and resolves its hooks once,
//! together with every record nested in its inferred fields, producing a
//! [`Generator`] whose [`generate`](Generator::generate) runs a single
//! attempt: each drawn field in declaration order is drawn from its
//! manual-draw hook or its value source, post-draw hooks run as soon as
//! their trigger field is stored, and the record is constructed from the
//! drawn values. Nested records are drawn the same way within the attempt.
//! [`RecordStrategy`] retries rejected attempts through the runner's
//! local-reject budget.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use fieldgen_core::{CoreError, RecordInstance, TypeId, TypeRegistry, Value};
use indexmap::IndexMap;
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use proptest::strategy::{Just, NewTree, Strategy};
use proptest::test_runner::{Reason, TestRunner};

use crate::classify::{classify, Classification};
use crate::config::InstancesConfig;
use crate::draw::{Drawer, RecordDraws};
use crate::error::{DrawError, StrategyError};
use crate::hooks::{resolve, HookTables};
use crate::partial::PartialInstance;
use crate::source::ValueSource;

/// Everything an attempt at one record type needs.
struct Plan {
    type_id: TypeId,
    record: String,
    drawn: Vec<String>,
    sources: IndexMap<String, ValueSource>,
    hooks: HookTables,
}

impl Plan {
    fn new(registry: &TypeRegistry, id: TypeId) -> Result<Plan, StrategyError> {
        let Classification { drawn, sources } = classify(registry, id)?;
        let hooks = resolve(registry, id, &drawn)?;
        Ok(Plan {
            type_id: id,
            record: registry.display_name(id),
            drawn,
            sources,
            hooks,
        })
    }

    /// Records drawn for this one's inferred fields, by field, with whether
    /// the way there is guarded.
    fn nested(&self) -> Vec<(&str, TypeId, bool)> {
        let mut nested = Vec::new();
        for field in &self.drawn {
            if self.hooks.manual_for(field).is_some() {
                continue;
            }
            if let Some(ValueSource::Inferred { inference, .. }) = self.sources.get(field) {
                for (id, guarded) in inference.nested_records() {
                    nested.push((field.as_str(), id, guarded));
                }
            }
        }
        nested
    }
}

/// The plans of a record and of every record nested in it.
struct Plans {
    registry: Arc<TypeRegistry>,
    root: Plan,
    nested: IndexMap<TypeId, Plan>,
    translate_validation: bool,
}

impl Plans {
    fn get(&self, id: TypeId) -> Option<&Plan> {
        if id == self.root.type_id {
            Some(&self.root)
        } else {
            self.nested.get(&id)
        }
    }

    /// Fails on a record that contains itself with neither an optional nor
    /// an enum unit variant in between, which has no finite instance.
    fn check_finite(&self) -> Result<(), StrategyError> {
        let plans: Vec<&Plan> = std::iter::once(&self.root).chain(self.nested.values()).collect();
        let mut graph: DiGraph<TypeId, String> = DiGraph::new();
        let nodes: HashMap<TypeId, NodeIndex> = plans
            .iter()
            .map(|plan| (plan.type_id, graph.add_node(plan.type_id)))
            .collect();
        for plan in &plans {
            let Some(&from) = nodes.get(&plan.type_id) else {
                continue;
            };
            for (field, id, guarded) in plan.nested() {
                match nodes.get(&id) {
                    Some(&to) if !guarded => {
                        graph.add_edge(from, to, field.to_string());
                    }
                    _ => {}
                }
            }
        }

        let Err(cycle) = toposort(&graph, None) else {
            return Ok(());
        };
        let from = cycle.node_id();
        let plan = self.get(graph[from]).unwrap_or(&self.root);
        let field = graph
            .edges(from)
            .find(|edge| has_path_connecting(&graph, edge.target(), from, None))
            .map(|edge| edge.weight().clone())
            .unwrap_or_default();
        Err(StrategyError::SourceResolution {
            record: plan.record.clone(),
            field,
            reason: format!(
                "'{}' contains itself without an optional or an enum unit variant in between",
                plan.record
            ),
        })
    }

    /// Runs one attempt at record `id`.
    fn attempt(&self, id: TypeId, drawer: &mut Drawer<'_>) -> Result<RecordInstance, DrawError> {
        let plan = self.get(id).ok_or(DrawError::Unplanned { id })?;
        let owner = self
            .registry
            .record(id)
            .ok_or(DrawError::Construct(CoreError::NotARecord { id }))?;
        let mut values: IndexMap<String, Value> = IndexMap::with_capacity(plan.drawn.len());

        for field in &plan.drawn {
            let value = match (plan.hooks.manual_for(field), plan.sources.get(field)) {
                (Some(hook), _) => {
                    let partial = PartialInstance::from_map(&values);
                    hook.draw(owner, drawer, field, &partial)?
                }
                (None, Some(source)) => drawer.draw_source(source)?,
                (None, None) => {
                    return Err(DrawError::Construct(CoreError::MissingArgument {
                        record: plan.record.clone(),
                        field: field.clone(),
                    }))
                }
            };
            values.insert(field.clone(), value);

            for hook in plan.hooks.post_for(field) {
                let partial = PartialInstance::from_map(&values);
                hook.check(owner, &partial)?;
            }
        }

        match self.registry.construct(id, values) {
            Ok(instance) => Ok(instance),
            Err(CoreError::Validation(err)) if self.translate_validation => {
                tracing::trace!(record = %plan.record, error = %err, "validation failure rejected");
                Err(DrawError::Rejected(Reason::from(err.to_string())))
            }
            Err(CoreError::Validation(err)) => Err(DrawError::Validation(err)),
            Err(err) => Err(DrawError::Construct(err)),
        }
    }
}

impl RecordDraws for Plans {
    fn draw_record(&self, id: TypeId, drawer: &mut Drawer<'_>) -> Result<RecordInstance, DrawError> {
        self.attempt(id, drawer)
    }
}

/// Produces instances of one record type, one attempt at a time.
///
/// Cloning is cheap; clones share the same resolved plans.
#[derive(Clone)]
pub struct Generator {
    plans: Arc<Plans>,
}

/// Classifies record `id`, resolves its hooks and returns a generator for it.
///
/// Records nested in inferred fields are planned too, so a structural error
/// anywhere below `id` is reported here, before any draw.
pub fn build_generator(
    registry: &Arc<TypeRegistry>,
    id: TypeId,
    config: &InstancesConfig,
) -> Result<Generator, StrategyError> {
    let root = Plan::new(registry, id)?;
    let mut nested: IndexMap<TypeId, Plan> = IndexMap::new();
    let mut pending: Vec<TypeId> = root.nested().into_iter().map(|(_, id, _)| id).collect();
    while let Some(next) = pending.pop() {
        if next == id || nested.contains_key(&next) {
            continue;
        }
        let plan = Plan::new(registry, next)?;
        pending.extend(plan.nested().into_iter().map(|(_, id, _)| id));
        nested.insert(next, plan);
    }

    let plans = Plans {
        registry: Arc::clone(registry),
        root,
        nested,
        translate_validation: config.translates_validation(),
    };
    plans.check_finite()?;

    tracing::debug!(
        record = %plans.root.record,
        drawn = plans.root.drawn.len(),
        manual_draw = plans.root.hooks.manual_draw.len(),
        nested = plans.nested.len(),
        translate_validation = plans.translate_validation,
        "built instance generator"
    );

    Ok(Generator {
        plans: Arc::new(plans),
    })
}

impl Generator {
    pub fn type_id(&self) -> TypeId {
        self.plans.root.type_id
    }

    /// Drawn field names in draw order.
    pub fn drawn(&self) -> &[String] {
        &self.plans.root.drawn
    }

    pub fn sources(&self) -> &IndexMap<String, ValueSource> {
        &self.plans.root.sources
    }

    pub fn hooks(&self) -> &HookTables {
        &self.plans.root.hooks
    }

    /// Records nested below this one, in the order they were planned.
    pub fn nested_records(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.plans.nested.keys().copied()
    }

    pub fn translates_validation(&self) -> bool {
        self.plans.translate_validation
    }

    /// Runs one generation attempt.
    pub fn generate(&self, runner: &mut TestRunner) -> Result<RecordInstance, DrawError> {
        let plans: &Plans = &self.plans;
        let mut drawer = Drawer::with_records(runner, plans);
        plans.attempt(plans.root.type_id, &mut drawer)
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("record", &self.plans.root.record)
            .field("drawn", &self.plans.root.drawn)
            .field("hooks", &self.plans.root.hooks)
            .field("nested", &self.plans.nested.len())
            .field("translate_validation", &self.plans.translate_validation)
            .finish()
    }
}

/// A strategy producing instances of a record type.
///
/// Instances do not shrink.
#[derive(Debug, Clone)]
pub struct RecordStrategy {
    generator: Generator,
}

impl RecordStrategy {
    pub fn generator(&self) -> &Generator {
        &self.generator
    }
}

impl Strategy for RecordStrategy {
    type Tree = Just<RecordInstance>;
    type Value = RecordInstance;

    fn new_tree(&self, runner: &mut TestRunner) -> NewTree<Self> {
        loop {
            match self.generator.generate(runner) {
                Ok(instance) => return Ok(Just(instance)),
                Err(DrawError::Rejected(reason)) => {
                    tracing::trace!(
                        record = %self.generator.plans.root.record,
                        reason = reason.message(),
                        "attempt rejected"
                    );
                    runner.reject_local(reason)?;
                }
                Err(err) => return Err(Reason::from(err.to_string())),
            }
        }
    }
}

/// A strategy for instances of record `id` with the default configuration.
pub fn instances(registry: &Arc<TypeRegistry>, id: TypeId) -> Result<RecordStrategy, StrategyError> {
    instances_with(registry, id, InstancesConfig::default())
}

/// A strategy for instances of record `id`.
pub fn instances_with(
    registry: &Arc<TypeRegistry>,
    id: TypeId,
    config: InstancesConfig,
) -> Result<RecordStrategy, StrategyError> {
    Ok(RecordStrategy {
        generator: build_generator(registry, id, &config)?,
    })
}
