use thiserror::Error;

use crate::traits::ProductStoreError;

/// Errors a match request can surface to the caller.
///
/// Only two things can fail a whole request: a request the client can correct, and an unexpected
/// failure in filtering/scoring/storage. Per-candidate verification failures are isolated inside
/// the orchestrator and never appear here; zero verifiable candidates is a successful, empty
/// outcome.
#[derive(Debug, Clone, Error)]
pub enum MatchingError {
    #[error("Invalid match request: {0}")]
    InvalidRequest(String),
    #[error("Product matching failed: {0}")]
    StoreError(#[from] ProductStoreError),
}

impl MatchingError {
    /// True if the client can correct this by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, MatchingError::InvalidRequest(_))
    }
}
