//! When an inference pass fires relative to the training loop

use serde::{Deserialize, Serialize};

use crate::error::{InferenceError, Result};

/// Training-loop position at an epoch boundary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TriggerContext {
    /// Epoch that just finished (0-indexed)
    pub epoch: usize,
    /// Total epochs planned
    pub max_epochs: usize,
    /// Global step count
    pub global_step: usize,
}

/// Epoch-based trigger schedule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerSchedule {
    /// Run a pass after every k-th epoch
    pub every_k_epochs: usize,
    /// Also run a pass before the first epoch
    pub before_train: bool,
}

impl Default for TriggerSchedule {
    fn default() -> Self {
        Self { every_k_epochs: 1, before_train: false }
    }
}

impl TriggerSchedule {
    pub fn every(k: usize) -> Self {
        Self { every_k_epochs: k, ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.every_k_epochs == 0 {
            return Err(InferenceError::config("schedule.every_k_epochs must be > 0"));
        }
        Ok(())
    }

    /// Whether a pass should run before the first epoch starts.
    pub fn should_trigger_before_train(&self) -> bool {
        self.before_train && self.every_k_epochs > 0
    }

    /// Whether the epoch that just ended should trigger a pass.
    pub fn should_trigger(&self, ctx: &TriggerContext) -> bool {
        self.every_k_epochs > 0 && (ctx.epoch + 1).is_multiple_of(self.every_k_epochs)
    }
}
