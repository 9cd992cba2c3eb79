use chrono::{DateTime, Utc};

use crate::verification::VerifiedCandidate;

/// The result of one match request: verified candidates sorted by descending score. Transport
/// formatting (display prices, availability strings) is the server's concern.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub generated_at: DateTime<Utc>,
    pub currency: String,
    pub results: Vec<VerifiedCandidate>,
}

impl MatchOutcome {
    pub fn empty(currency: String) -> Self {
        Self { generated_at: Utc::now(), currency, results: Vec::new() }
    }
}
