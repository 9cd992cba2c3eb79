//! # Candidate filtering and relevance scoring
//!
//! Both halves of this module are synchronous and pure: the filter decides whether a product is
//! eligible at all, the scorer ranks the eligible ones. All I/O (the candidate query, live
//! verification) lives elsewhere.
pub mod filter;
pub mod scorer;

pub use filter::{matches_avoided, matches_required, product_search_terms, CANDIDATE_CAP};
pub use scorer::score;
