//! Run configuration, validation, and error types.
//!
//! [`RunConfig`] is the input for constructing a
//! [`TurnCoordinator`](crate::TurnCoordinator). [`validate()`](RunConfig::validate)
//! checks structural invariants at startup so that partitioning and
//! telemetry never see a degenerate value mid-run.

use std::time::Duration;

use gol_core::TurnId;
use thiserror::Error;

/// Default interval between `AliveCellsCount` telemetry events.
pub const DEFAULT_TELEMETRY_INTERVAL: Duration = Duration::from_secs(2);

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`RunConfig::validate()`] or while starting the
/// threads a run needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Height or width is zero.
    #[error("image dimensions must be non-zero, got {height}x{width}")]
    EmptyImage {
        /// Configured image height.
        height: usize,
        /// Configured image width.
        width: usize,
    },
    /// Thread count is zero.
    #[error("thread count must be at least 1")]
    NoThreads,
    /// Telemetry interval is zero.
    #[error("telemetry interval must be non-zero")]
    ZeroTelemetryInterval,
    /// A turn history must hold at least two records.
    #[error("turn history capacity must be at least 2, got {capacity}")]
    HistoryTooShort {
        /// Configured capacity.
        capacity: usize,
    },
    /// A background thread could not be spawned.
    #[error("thread spawn failed: {reason}")]
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

// ── RunConfig ──────────────────────────────────────────────────────

/// Parameters of a single run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// Turn the run stops at. A run resumed from a checkpoint at turn `k`
    /// executes `turns - k` further turns.
    pub turns: u32,
    /// Number of bands each turn is split into.
    pub threads: usize,
    /// Image width (columns).
    pub width: usize,
    /// Image height (rows).
    pub height: usize,
    /// Interval between `AliveCellsCount` events. Default: 2 seconds.
    pub telemetry_interval: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            turns: 10_000,
            threads: 8,
            width: 512,
            height: 512,
            telemetry_interval: DEFAULT_TELEMETRY_INTERVAL,
        }
    }
}

impl RunConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyImage {
                height: self.height,
                width: self.width,
            });
        }
        if self.threads == 0 {
            return Err(ConfigError::NoThreads);
        }
        if self.telemetry_interval.is_zero() {
            return Err(ConfigError::ZeroTelemetryInterval);
        }
        Ok(())
    }

    /// The configured final turn.
    pub fn target_turn(&self) -> TurnId {
        TurnId(self.turns)
    }

    /// Name of the initial image: `"{height}x{width}"`.
    pub fn input_name(&self) -> String {
        format!("{}x{}", self.height, self.width)
    }

    /// Name of a snapshot taken at `turn`: `"{width}x{height}x{turn}"`.
    pub fn output_name(&self, turn: TurnId) -> String {
        format!("{}x{}x{}", self.width, self.height, turn)
    }
}
