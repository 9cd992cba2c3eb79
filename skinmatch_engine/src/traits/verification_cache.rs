use std::{fmt::Display, time::Duration};

use async_trait::async_trait;

use crate::{db_types::Retailer, traits::LiveResult};

/// Cache key for one verification window: a (retailer, SKU, postcode) triple. Requests without a
/// postcode share the `"none"` slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub retailer: Retailer,
    pub retailer_sku: String,
    pub postcode: String,
}

impl CacheKey {
    pub fn new(retailer: Retailer, retailer_sku: impl Into<String>, postcode: Option<&str>) -> Self {
        Self {
            retailer,
            retailer_sku: retailer_sku.into(),
            postcode: postcode.unwrap_or("none").to_string(),
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "live:{}:{}:{}", self.retailer, self.retailer_sku, self.postcode)
    }
}

/// A short-TTL key-value store that avoids redundant live calls within a verification window.
///
/// Concurrent read/write safe. Set-if-absent semantics are not required: concurrent writers for
/// the same key within a window compute equivalent data, so last-writer-wins is acceptable.
#[async_trait]
pub trait VerificationCache: Send + Sync {
    /// Returns the cached result for `key` if present and not expired.
    async fn get(&self, key: &CacheKey) -> Option<LiveResult>;

    /// Stores `value` under `key` for `ttl`.
    async fn put(&self, key: CacheKey, value: LiveResult, ttl: Duration);
}
