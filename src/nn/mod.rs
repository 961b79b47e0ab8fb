//! Neural network modules used as encoders and decoders
//!
//! Models only rely on the [`Module`] contract; the built-in networks are a
//! closed set resolved once from a [`NetworkKind`] configuration.

mod linear;
mod mlp;
mod network;

pub use linear::Linear;
pub use mlp::Mlp;
pub use network::{Network, NetworkKind};

use crate::Tensor;

/// A differentiable function with trainable parameters
pub trait Module {
    /// Map a batch `(n, in)` to `(n, out)`
    fn forward(&self, x: &Tensor) -> Tensor;

    /// Handles to every trainable parameter
    fn parameters(&self) -> Vec<Tensor>;

    /// Total number of scalar parameters
    fn num_parameters(&self) -> usize {
        self.parameters().iter().map(Tensor::len).sum()
    }
}
