//! Experiment validation
//!
//! Checks an experiment specification for consistency before any data is
//! generated.

mod validator;

#[cfg(test)]
mod tests;

pub use validator::validate_spec;
