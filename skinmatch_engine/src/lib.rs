//! Skincare Matching Engine
//!
//! The matching-and-verification core of the skincare matching gateway: it takes a buyer's
//! ingredient requirements and finds catalog products that satisfy them, then verifies in near
//! real time that the best matches are actually purchasable at their advertised price.
//!
//! The library is divided into three main sections:
//! 1. The matching pipeline: [`mod@ingredients`] canonicalizes free-text ingredient names against
//!    a curated alias table (with a fuzzy fallback), [`mod@matching`] filters candidates and
//!    computes relevance scores.
//! 2. Live verification ([`mod@verification`]): a concurrent orchestrator that decides, per
//!    top-scored candidate, whether a cached or recent value suffices or a live retailer check is
//!    required, and fans the live checks out under one soft deadline.
//! 3. Persistence ([`mod@traits`], `sqlite`): the engine only ever talks to storage, caching and
//!    retailers through traits, so backends and adapters are swappable. A SQLite backend is
//!    provided; concrete retailer adapters live in their own crate.
//!
//! [`MatchFlowApi`] ties the sections together and is the type servers should hold.
pub mod db_types;
pub mod ingredients;
mod match_api;
pub mod matching;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;
pub mod verification;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use match_api::{MatchFlowApi, MatchOptions, MatchOutcome, MatchingError};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
#[cfg(feature = "sqlite")]
pub use sqlite::db::db_url;
