//! Configuration for instance strategies.
//!
//! Validation translation turns a record's structured validation failure
//! into a rejected draw instead of an error. It is available when the
//! `validation` feature is enabled, on by default process-wide, and can be
//! overridden per strategy through [`InstancesConfig`].
//!
//! The process-wide default is read once from the environment:
//! - `FIELDGEN_DISABLE_VALIDATION_TRANSLATION`: `1`, `true` or `yes`
//!   disables translation (default: enabled)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

/// Environment variable seeding the process-wide translation default.
pub const DISABLE_TRANSLATION_ENV: &str = "FIELDGEN_DISABLE_VALIDATION_TRANSLATION";

static TRANSLATE_VALIDATION: OnceLock<AtomicBool> = OnceLock::new();

fn process_flag() -> &'static AtomicBool {
    TRANSLATE_VALIDATION.get_or_init(|| {
        let disabled = std::env::var(DISABLE_TRANSLATION_ENV)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        AtomicBool::new(!disabled)
    })
}

/// Sets the process-wide default for validation translation.
pub fn set_validation_translation(enabled: bool) {
    process_flag().store(enabled, Ordering::Relaxed);
}

/// Returns whether validation failures are translated into rejections by
/// default. Always `false` without the `validation` feature.
pub fn validation_translation_enabled() -> bool {
    cfg!(feature = "validation") && process_flag().load(Ordering::Relaxed)
}

/// Per-strategy configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstancesConfig {
    /// `Some(true)` propagates validation failures unchanged, `Some(false)`
    /// translates them (when the capability is available), `None` follows
    /// the process-wide default.
    pub disable_validation_translation: Option<bool>,
}

impl InstancesConfig {
    /// A configuration that propagates validation failures.
    pub fn without_validation_translation() -> Self {
        InstancesConfig {
            disable_validation_translation: Some(true),
        }
    }

    /// Resolves whether a strategy built with this configuration translates
    /// validation failures.
    pub fn translates_validation(&self) -> bool {
        match self.disable_validation_translation {
            Some(true) => false,
            Some(false) => cfg!(feature = "validation"),
            None => validation_translation_enabled(),
        }
    }
}
