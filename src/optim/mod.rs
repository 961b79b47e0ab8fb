//! Optimizers for training encoders and decoders
//!
//! Each optimizer owns a parameter group: handles to shared parameter
//! tensors. Two optimizers built over disjoint groups never touch each
//! other's gradients.

mod adam;
mod clip;
mod optimizer;

pub use adam::Adam;
pub use clip::{clip_grad_norm, grad_norm};
pub use optimizer::Optimizer;
