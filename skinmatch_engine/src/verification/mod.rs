//! # Live verification
//!
//! Decides, per top-scored candidate, whether a cached or recent value suffices or a live check
//! is required, and fans the live checks out concurrently under per-adapter rate limits and one
//! global soft deadline. Partial failure is the normal case here: a candidate that cannot be
//! verified is dropped from the result set, never an error to the caller.
mod cache;
mod registry;
mod verifier;

pub use cache::MemoryCache;
pub use registry::AdapterRegistry;
pub use verifier::{LiveVerifier, VerifiedCandidate, VerifyOptions};
