use async_trait::async_trait;
use thiserror::Error;

use crate::{
    db_types::{Product, Retailer},
    traits::{LiveResult, ParsedDetail, ProductSeed},
};

/// The capability set every retailer integration implements, for one retailer/country pair.
///
/// Variants are polymorphic over how they talk to the retailer (official API, scraping); the
/// engine never knows the difference. Each concrete adapter enforces its own concurrency ceiling
/// and minimum inter-request spacing internally, so one retailer's load never throttles
/// another's.
///
/// `live_check` must always return a [`LiveResult`]: when the retailer backend is unreachable or
/// the data is unparseable it returns a result with `status_code = "error"` rather than an `Err`,
/// keeping the orchestrator's failure isolation simple. `search` and `fetch_detail_page` are
/// fallible in the ordinary way since their callers (catalog ingestion) want the cause.
#[async_trait]
pub trait RetailerAdapter: Send + Sync {
    /// The retailer this adapter serves.
    fn retailer(&self) -> Retailer;

    /// The ISO-3166 alpha-2 country this adapter serves.
    fn country(&self) -> &str;

    /// Searches the retailer for products matching `query`.
    async fn search(&self, query: &str, country: &str) -> Result<Vec<ProductSeed>, AdapterError>;

    /// Fetches and parses one product detail page, by URL or retailer SKU.
    async fn fetch_detail_page(&self, url_or_sku: &str) -> Result<ParsedDetail, AdapterError>;

    /// Verifies the product's current price and availability, optionally for delivery to
    /// `postcode`.
    async fn live_check(&self, product: &Product, postcode: Option<&str>) -> LiveResult;
}

#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    #[error("Adapter is not configured: {0}")]
    NotConfigured(String),
    #[error("Request to retailer failed: {0}")]
    Http(String),
    #[error("Retailer returned status {0}")]
    Status(u16),
    #[error("Could not parse retailer response: {0}")]
    Parse(String),
    #[error("Request throttle unavailable: {0}")]
    Throttle(String),
}
