//! Tests for autograd operations with gradient checking

mod prop_basic;
mod prop_matmul;
mod test_utils;
