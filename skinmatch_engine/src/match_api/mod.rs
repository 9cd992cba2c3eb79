//! # Match flow API
//!
//! The public-facing engine API: takes a validated [`crate::db_types::MatchRequest`] through
//! normalization, candidate filtering, scoring and live verification, and returns the verified,
//! score-sorted result set.
mod errors;
mod match_flow;
mod match_objects;

pub use errors::MatchingError;
pub use match_flow::{MatchFlowApi, MatchOptions};
pub use match_objects::MatchOutcome;
