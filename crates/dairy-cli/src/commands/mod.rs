//! CLI command implementations for the dairy admin backend.

pub mod audit;
pub mod keys;
pub mod serve;
