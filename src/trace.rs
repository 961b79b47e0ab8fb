//! Stage timing for training and data generation.
//!
//! A process-wide [`TRACER`] aggregates wall-clock time per [`TraceStep`].
//! It is disabled by default; enable it around a run and print
//! [`Tracer::report`] to see where time goes.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// The measured stages of a CCA run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceStep {
    /// Encoder (and decoder) forward passes
    Encode,
    /// Correlation objective evaluation
    Objective,
    /// Reverse-mode gradient propagation
    Backward,
    /// Optimizer parameter update
    Step,
    /// Running covariance blend and whitening (orthogonal iterations)
    Covariance,
    /// Joint covariance factorization in the data generator
    Cholesky,
    /// CP decomposition of a cross-moment tensor
    Decompose,
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Accumulated timings of one stage.
#[derive(Debug, Clone, Default)]
pub struct StageStats {
    pub count: usize,
    pub total: Duration,
    pub max: Duration,
    /// Label of the slowest span
    pub slowest: String,
}

impl StageStats {
    fn record(&mut self, elapsed: Duration, label: String) {
        self.count += 1;
        self.total += elapsed;
        if elapsed >= self.max {
            self.max = elapsed;
            self.slowest = label;
        }
    }

    pub fn mean(&self) -> Duration {
        match u32::try_from(self.count) {
            Ok(n) if n > 0 => self.total / n,
            _ => Duration::ZERO,
        }
    }
}

/// Thread-safe per-stage timing aggregator.
pub struct Tracer {
    enabled: AtomicBool,
    stages: Mutex<HashMap<TraceStep, StageStats>>,
}

impl Tracer {
    /// Create a new, disabled tracer.
    pub fn new() -> Self {
        Self { enabled: AtomicBool::new(false), stages: Mutex::new(HashMap::new()) }
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn stages(&self) -> MutexGuard<'_, HashMap<TraceStep, StageStats>> {
        self.stages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add one measured span to `step`; ignored while disabled.
    pub fn record(&self, step: TraceStep, elapsed: Duration, label: impl Into<String>) {
        if self.is_enabled() {
            self.stages().entry(step).or_default().record(elapsed, label.into());
        }
    }

    /// Run `f`, timing it under `step` when enabled.
    ///
    /// Spans of the same step may nest; each is measured independently.
    #[inline]
    pub fn span<F, R>(&self, step: TraceStep, label: impl Into<String>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.is_enabled() {
            return f();
        }
        let started = Instant::now();
        let result = f();
        self.record(step, started.elapsed(), label);
        result
    }

    /// Number of recorded spans for `step`.
    pub fn count(&self, step: TraceStep) -> usize {
        self.stages().get(&step).map_or(0, |s| s.count)
    }

    /// Snapshot of the accumulated timings of `step`.
    pub fn stats(&self, step: TraceStep) -> Option<StageStats> {
        self.stages().get(&step).cloned()
    }

    pub fn clear(&self) {
        self.stages().clear();
    }

    /// Render a per-stage table, slowest stage first.
    pub fn report(&self) -> String {
        let stages = self.stages();
        if stages.is_empty() {
            return "No measurements recorded. Enable tracing with TRACER.enable()".to_string();
        }

        let grand_total: Duration = stages.values().map(|s| s.total).sum();
        let mut rows: Vec<(&TraceStep, &StageStats)> = stages.iter().collect();
        rows.sort_by(|a, b| b.1.total.cmp(&a.1.total));

        let rule = "-".repeat(72);
        let mut out = format!("CCA TRACE REPORT\nTotal measured: {grand_total:.2?}\n{rule}\n");
        out.push_str(&format!(
            "{:<12} | {:>6} | {:>12} | {:>12} | {:>7} | slowest\n",
            "Stage", "Count", "Total", "Mean", "% Time"
        ));
        out.push_str(&format!("{rule}\n"));
        for (step, stats) in rows {
            let share = if grand_total.is_zero() {
                0.0
            } else {
                100.0 * stats.total.as_secs_f64() / grand_total.as_secs_f64()
            };
            out.push_str(&format!(
                "{:<12} | {:>6} | {:>12.2?} | {:>12.2?} | {:>6.2}% | {}\n",
                step.to_string(),
                stats.count,
                stats.total,
                stats.mean(),
                share,
                stats.slowest
            ));
        }
        out
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

/// Global tracer instance.
pub static TRACER: LazyLock<Tracer> = LazyLock::new(Tracer::new);
