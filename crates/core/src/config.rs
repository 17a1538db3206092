//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services. Request
//! handling never reads process-wide environment variables.

use crate::constants::{DEFAULT_ANALYSIS_DELAY_MS, MAX_ANALYSIS_DELAY_MS};
use crate::{IntakeError, IntakeResult};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    analysis_delay: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::InvalidInput` if `analysis_delay` exceeds
    /// [`MAX_ANALYSIS_DELAY_MS`].
    pub fn new(analysis_delay: Duration) -> IntakeResult<Self> {
        if analysis_delay > Duration::from_millis(MAX_ANALYSIS_DELAY_MS) {
            return Err(IntakeError::InvalidInput(format!(
                "analysis delay cannot exceed {} ms",
                MAX_ANALYSIS_DELAY_MS
            )));
        }

        Ok(Self { analysis_delay })
    }

    /// How long an analysis run stays in the running state before results appear.
    pub fn analysis_delay(&self) -> Duration {
        self.analysis_delay
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            analysis_delay: Duration::from_millis(DEFAULT_ANALYSIS_DELAY_MS),
        }
    }
}

/// Parse the analysis delay from an optional millisecond string.
///
/// If `value` is `None` or empty/whitespace, returns the default delay.
pub fn analysis_delay_from_env_value(value: Option<String>) -> IntakeResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let millis = match value {
        Some(v) => v.parse::<u64>().map_err(|e| {
            IntakeError::InvalidInput(format!("invalid analysis delay '{}': {}", v, e))
        })?,
        None => DEFAULT_ANALYSIS_DELAY_MS,
    };

    Ok(Duration::from_millis(millis))
}
