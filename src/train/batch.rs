//! Minibatching over row-aligned views

use crate::Tensor;
use ndarray::{Array2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;

/// The same rows taken from every view
#[derive(Clone)]
pub struct Batch {
    pub views: Vec<Tensor>,
}

impl Batch {
    /// Gather `rows` from each view as constant tensors
    pub fn from_rows(views: &[Array2<f64>], rows: &[usize]) -> Self {
        Self { views: views.iter().map(|v| Tensor::constant(v.select(Axis(0), rows))).collect() }
    }

    /// Number of samples in the batch
    pub fn size(&self) -> usize {
        self.views.first().map_or(0, Tensor::rows)
    }
}

/// Split `0..n` into consecutive chunks of at most `batch_size` rows,
/// optionally shuffled first.
///
/// A trailing chunk with a single row is dropped: covariance estimates need
/// at least two samples.
pub fn minibatch_indices<R: Rng>(
    n: usize,
    batch_size: usize,
    shuffle: bool,
    rng: &mut R,
) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..n).collect();
    if shuffle {
        order.shuffle(rng);
    }
    let batch_size = batch_size.max(1);
    order
        .chunks(batch_size)
        .filter(|chunk| chunk.len() >= 2)
        .map(<[usize]>::to_vec)
        .collect()
}
