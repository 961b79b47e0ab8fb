//! Autograd operations with backward passes
//!
//! This module provides differentiable operations for automatic differentiation.

mod activations;
mod basic;
mod linalg;
mod matmul;
mod structure;

pub use activations::{leaky_relu, relu, sigmoid};
pub use basic::{add, add_bias, add_scalar, frobenius_norm, mean, mul, scale, sub, sum};
pub use linalg::{sym_pow, top_eigvals_sum, trace};
pub use matmul::{matmul, transpose};
pub use structure::{center, concat_cols, row_khatri_rao};
