//! Test support: product fixtures, in-memory engine doubles, and scratch-database setup.
pub mod fixtures;
pub mod stubs;

#[cfg(all(feature = "test_utils", feature = "sqlite"))]
pub mod prepare_env;
