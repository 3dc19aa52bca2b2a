//! The draw primitive handed to manual-draw hooks.

use fieldgen_core::{RecordInstance, TypeId, Value};
use proptest::strategy::{Strategy, ValueTree};
use proptest::test_runner::{Config, Reason, RngAlgorithm, TestRng, TestRunner};

use crate::error::DrawError;
use crate::source::ValueSource;

/// Generates nested record instances on behalf of inferred sources.
pub(crate) trait RecordDraws {
    fn draw_record(&self, id: TypeId, drawer: &mut Drawer<'_>) -> Result<RecordInstance, DrawError>;
}

/// Draws values from strategies within one generation attempt.
///
/// Rejection is a returned [`DrawError::Rejected`]; propagate it with `?` to
/// abandon the attempt.
pub struct Drawer<'r> {
    runner: &'r mut TestRunner,
    records: Option<&'r dyn RecordDraws>,
    depth: usize,
}

impl<'r> Drawer<'r> {
    /// A drawer for strategies and non-record sources only.
    pub fn new(runner: &'r mut TestRunner) -> Self {
        Drawer {
            runner,
            records: None,
            depth: 0,
        }
    }

    pub(crate) fn with_records(runner: &'r mut TestRunner, records: &'r dyn RecordDraws) -> Self {
        Drawer {
            runner,
            records: Some(records),
            depth: 0,
        }
    }

    /// Draws one value from `strategy`.
    ///
    /// A strategy that fails to produce a value (a filter giving up, say)
    /// rejects the attempt.
    pub fn draw<S: Strategy>(&mut self, strategy: &S) -> Result<S::Value, DrawError> {
        let tree = strategy.new_tree(self.runner).map_err(DrawError::Rejected)?;
        Ok(tree.current())
    }

    /// Draws a field value from its resolved source. Constants are returned
    /// without consulting the engine.
    pub fn draw_source(&mut self, source: &ValueSource) -> Result<Value, DrawError> {
        match source {
            ValueSource::Constant(value) => Ok(value.clone()),
            ValueSource::Explicit(strategy) => self.draw(strategy),
            ValueSource::Inferred { inference, .. } => inference.draw(self),
        }
    }

    /// Draws an instance of nested record `id`. Errors of the nested
    /// attempt propagate unchanged.
    pub(crate) fn draw_record(&mut self, id: TypeId) -> Result<RecordInstance, DrawError> {
        let records = self.records.ok_or(DrawError::Unplanned { id })?;
        self.depth += 1;
        let drawn = records.draw_record(id, self);
        self.depth -= 1;
        drawn
    }

    /// Number of nested records currently being drawn.
    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    /// Builds a rejection for the current attempt.
    pub fn reject(&self, reason: impl Into<Reason>) -> DrawError {
        DrawError::Rejected(reason.into())
    }

    /// Rejects the current attempt unless `condition` holds.
    pub fn assume(&self, condition: bool, reason: impl Into<Reason>) -> Result<(), DrawError> {
        if condition {
            Ok(())
        } else {
            Err(self.reject(reason))
        }
    }

    pub fn runner(&mut self) -> &mut TestRunner {
        &mut *self.runner
    }
}

impl std::fmt::Debug for Drawer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Drawer").finish_non_exhaustive()
    }
}

/// Creates a runner whose draws are fully determined by `seed`.
pub fn runner_from_seed(seed: u64) -> TestRunner {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&seed.to_le_bytes());
    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &bytes);
    TestRunner::new_with_rng(Config::default(), rng)
}
