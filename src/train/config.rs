//! Training configuration and per-epoch bookkeeping

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Training loop configuration
///
/// ```yaml
/// epochs: 50
/// batch_size: 128
/// shuffle: true
/// seed: 7
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Passes over the data
    pub epochs: usize,
    /// Rows per minibatch; `None` trains on the full data every step
    pub batch_size: Option<usize>,
    /// Reshuffle rows every epoch
    pub shuffle: bool,
    /// Seed for row shuffling
    pub seed: u64,
    /// Emit an `info` log line every this many epochs
    pub log_every: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self { epochs: 10, batch_size: None, shuffle: true, seed: 0, log_every: 1 }
    }
}

impl TrainConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_log_every(mut self, log_every: usize) -> Self {
        self.log_every = log_every;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidConfiguration("epochs must be positive".into()));
        }
        if self.batch_size.is_some_and(|b| b < 2) {
            return Err(Error::InvalidConfiguration(format!(
                "batch_size must be at least 2, got {:?}",
                self.batch_size
            )));
        }
        if self.log_every == 0 {
            return Err(Error::InvalidConfiguration("log_every must be positive".into()));
        }
        Ok(())
    }
}

/// Mean loss per completed epoch
#[derive(Debug, Clone, Default)]
pub struct MetricsTracker {
    pub epoch: usize,
    pub losses: Vec<f64>,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_epoch(&mut self, loss: f64) {
        self.losses.push(loss);
        self.epoch += 1;
    }

    pub fn best_loss(&self) -> Option<f64> {
        self.losses.iter().copied().reduce(f64::min)
    }

    pub fn last_loss(&self) -> Option<f64> {
        self.losses.last().copied()
    }
}
