//! Tensor decompositions
//!
//! Only CP-ALS is provided; it backs the tensor CCA objective and the
//! linear tensor CCA solver.

mod cp;

pub use cp::{cp_als, unfold, CpDecomp, InitStrategy};
