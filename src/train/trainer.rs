//! Epoch loop shared by every deep model

use super::{minibatch_indices, Batch, MetricsTracker, TrainConfig};
use crate::error::{Error, Result};
use crate::models::DeconfoundingDcca;
use crate::Tensor;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;

/// A model trained one minibatch at a time
pub trait DeepModel {
    /// Run one optimisation step on a batch and return its loss
    fn update_weights(&mut self, views: &[Tensor]) -> Result<f64>;

    /// Name used in log lines
    fn name(&self) -> &'static str;
}

/// Result of a training run
#[derive(Debug, Clone)]
pub struct TrainResult {
    /// Number of completed epochs
    pub final_epoch: usize,
    /// Mean loss of the last epoch
    pub final_loss: f64,
    /// Lowest mean epoch loss
    pub best_loss: f64,
    /// Mean loss of every epoch
    pub epoch_losses: Vec<f64>,
    /// Total training time in seconds
    pub elapsed_secs: f64,
}

/// Train `model` on row-aligned `views`
///
/// # Errors
///
/// Fails on an invalid configuration, on views with different row counts, and
/// propagates the first error raised by `update_weights`.
pub fn fit<M: DeepModel>(
    model: &mut M,
    views: &[Array2<f64>],
    config: &TrainConfig,
) -> Result<TrainResult> {
    let n = check_rows(views)?;
    let name = model.name();
    run_epochs(name, n, config, |rows| {
        let batch = Batch::from_rows(views, rows);
        model.update_weights(&batch.views)
    })
}

/// Train a deconfounding model; `confound` rows are batched alongside the
/// two views
pub fn fit_deconfounding(
    model: &mut DeconfoundingDcca,
    views: &[Array2<f64>],
    confound: &Array2<f64>,
    config: &TrainConfig,
) -> Result<TrainResult> {
    if views.len() != 2 {
        return Err(Error::InvalidConfiguration(format!(
            "deconfounding training takes two views, got {}",
            views.len()
        )));
    }
    let all: Vec<Array2<f64>> = views.iter().chain(std::iter::once(confound)).cloned().collect();
    let n = check_rows(&all)?;
    run_epochs("DeconfoundingDcca", n, config, |rows| {
        let batch = Batch::from_rows(&all, rows);
        model.update_weights(&batch.views[0], &batch.views[1], &batch.views[2])
    })
}

fn check_rows(views: &[Array2<f64>]) -> Result<usize> {
    let rows = views
        .first()
        .map(Array2::nrows)
        .ok_or_else(|| Error::InvalidConfiguration("no views to train on".into()))?;
    if let Some(bad) = views.iter().find(|v| v.nrows() != rows) {
        return Err(Error::ShapeMismatch {
            expected: format!("{rows} rows in every view"),
            actual: format!("{} rows", bad.nrows()),
        });
    }
    Ok(rows)
}

fn run_epochs<F>(name: &str, n: usize, config: &TrainConfig, mut step: F) -> Result<TrainResult>
where
    F: FnMut(&[usize]) -> Result<f64>,
{
    config.validate()?;
    let batch_size = config.batch_size.unwrap_or(n);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut metrics = MetricsTracker::new();
    let start = Instant::now();

    for epoch in 0..config.epochs {
        let batches = minibatch_indices(n, batch_size, config.shuffle, &mut rng);
        if batches.is_empty() {
            return Err(Error::InvalidConfiguration(format!(
                "{n} samples do not fill a batch of at least two rows"
            )));
        }

        let mut total = 0.0;
        for rows in &batches {
            total += step(rows)?;
        }
        let epoch_loss = total / batches.len() as f64;
        metrics.record_epoch(epoch_loss);

        if (epoch + 1) % config.log_every == 0 {
            tracing::info!(model = name, epoch = epoch + 1, loss = epoch_loss, "epoch finished");
        } else {
            tracing::debug!(model = name, epoch = epoch + 1, loss = epoch_loss, "epoch finished");
        }
    }

    Ok(TrainResult {
        final_epoch: metrics.epoch,
        final_loss: metrics.last_loss().unwrap_or(f64::NAN),
        best_loss: metrics.best_loss().unwrap_or(f64::NAN),
        epoch_losses: metrics.losses,
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}
