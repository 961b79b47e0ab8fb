//! Tape-based autograd engine
//!
//! Provides reverse-mode automatic differentiation over dense 2-D tensors.
//! Every operation records a [`BackwardOp`] on its output; [`backward`]
//! walks the recorded graph in reverse topological order.
//!
//! ```
//! use cca_zoo::autograd::{backward, matmul, sum, Tensor};
//! use ndarray::array;
//!
//! let w = Tensor::new(array![[1.0], [2.0]], true);
//! let x = Tensor::constant(array![[3.0, 4.0]]);
//! let y = sum(&matmul(&x, &w));
//! backward(&y, None);
//! assert_eq!(w.grad().unwrap(), array![[3.0], [4.0]]);
//! ```

mod backward;
mod ops;
mod tensor;

#[cfg(test)]
mod tests;

pub use backward::{backward, BackwardOp};
pub use ops::*;
pub use tensor::Tensor;
