//! Runtime configuration.
//!
//! Per-thread settings for the work loop. Loaded from the environment the
//! first time they are read, replaceable at any point with [`set_config`].

use std::cell::RefCell;

/// Milliseconds below which the work loop yields.
pub const YIELD_THRESHOLD_VAR: &str = "LUNA_YIELD_THRESHOLD_MS";

/// Hard cap on units of work per slice (`0` means no cap).
pub const MAX_UNITS_VAR: &str = "LUNA_MAX_UNITS_PER_SLICE";

/// Work loop tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeConfig {
    /// Yield once the deadline reports less than this many milliseconds.
    pub yield_threshold_ms: f64,
    /// Yield after this many units even if time remains.
    pub max_units_per_slice: Option<usize>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            yield_threshold_ms: 1.0,
            max_units_per_slice: None,
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by `LUNA_*` environment variables.
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(YIELD_THRESHOLD_VAR) {
            match raw.trim().parse::<f64>() {
                Ok(ms) if ms.is_finite() && ms >= 0.0 => config.yield_threshold_ms = ms,
                _ => log::warn!("ignoring {YIELD_THRESHOLD_VAR}={raw:?}: expected milliseconds"),
            }
        }

        if let Some(raw) = lookup(MAX_UNITS_VAR) {
            match raw.trim().parse::<usize>() {
                Ok(0) => config.max_units_per_slice = None,
                Ok(units) => config.max_units_per_slice = Some(units),
                Err(_) => log::warn!("ignoring {MAX_UNITS_VAR}={raw:?}: expected a unit count"),
            }
        }

        config
    }
}

thread_local! {
    static CONFIG: RefCell<RuntimeConfig> = RefCell::new(RuntimeConfig::from_env());
}

/// Current configuration.
pub fn config() -> RuntimeConfig {
    CONFIG.with(|c| *c.borrow())
}

/// Replace the configuration.
pub fn set_config(config: RuntimeConfig) {
    CONFIG.with(|c| *c.borrow_mut() = config);
}

/// Reload the configuration from the environment (for testing).
pub fn reset_config() {
    set_config(RuntimeConfig::from_env());
}
