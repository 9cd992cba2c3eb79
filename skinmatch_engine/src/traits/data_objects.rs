use chrono::{DateTime, Utc};

use crate::db_types::{SnapshotSource, StockStatus};

//--------------------------------------     ProductSeed     ---------------------------------------------------------

/// A product discovered via a retailer search, before the detail page has been fetched. Consumed
/// by the catalog-ingestion collaborator.
#[derive(Debug, Clone)]
pub struct ProductSeed {
    pub retailer_sku: String,
    pub name: String,
    pub brand: String,
    pub price: Option<f64>,
    pub currency: String,
    pub pdp_url: String,
    pub image_url: Option<String>,
    pub gtin: Option<String>,
}

//--------------------------------------     ParsedDetail    ---------------------------------------------------------

/// The parsed contents of one product detail page.
#[derive(Debug, Clone)]
pub struct ParsedDetail {
    pub name: String,
    pub brand: String,
    pub price: Option<f64>,
    pub currency: String,
    pub ingredients_raw: String,
    pub image_url: Option<String>,
    pub gtin: Option<String>,
    pub availability: StockStatus,
    pub volume_ml: Option<f64>,
}

//--------------------------------------      LiveResult     ---------------------------------------------------------

/// The outcome of one live check. Adapters always return one of these when reachable; failures
/// are encoded as `status_code = "error"` with null price/stock rather than raised, so the
/// orchestrator's failure isolation stays a plain branch.
#[derive(Debug, Clone)]
pub struct LiveResult {
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub in_stock: StockStatus,
    pub deliverable_postcode: Option<String>,
    pub ingredients_raw: Option<String>,
    pub status_code: String,
    pub fetched_at: DateTime<Utc>,
    pub source: SnapshotSource,
}

impl LiveResult {
    /// An error-status result, used by adapters when the retailer backend is unreachable or the
    /// response is unparseable.
    pub fn error(postcode: Option<String>, source: SnapshotSource) -> Self {
        Self {
            price: None,
            currency: None,
            in_stock: StockStatus::Unknown,
            deliverable_postcode: postcode,
            ingredients_raw: None,
            status_code: "error".to_string(),
            fetched_at: Utc::now(),
            source,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status_code == "error"
    }
}
