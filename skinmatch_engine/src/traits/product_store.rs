use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{NewLiveSnapshot, NewProduct, Product, Retailer};

/// The persistence contract the matching engine relies on.
///
/// Backends pre-filter candidates by country and price ceiling; the ingredient policy is applied
/// in memory by the caller. Write access from the engine is deliberately narrow: after a
/// successful live check, `record_verification` updates the product's price and
/// `last_live_verified` and appends the immutable snapshot in a single transaction. Everything
/// else about a product row belongs to the catalog-ingestion collaborator.
#[allow(async_fn_in_trait)]
pub trait ProductStore: Clone + Send + Sync {
    /// The URL of the underlying database.
    fn url(&self) -> &str;

    /// Fetches products for the given country, excluding those with a known price above
    /// `max_price` (unknown prices pass through), ordered by `last_seen` descending.
    fn fetch_candidates(
        &self,
        country: &str,
        max_price: Option<f64>,
    ) -> impl std::future::Future<Output = Result<Vec<Product>, ProductStoreError>> + Send;

    /// Fetches one product by its row id.
    fn fetch_product_by_id(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<Product>, ProductStoreError>> + Send;

    /// Fetches one product by its `(retailer, retailer_sku)` identity.
    fn fetch_product_by_sku(
        &self,
        retailer: &Retailer,
        retailer_sku: &str,
    ) -> impl std::future::Future<Output = Result<Option<Product>, ProductStoreError>> + Send;

    /// Inserts a catalog entry, or refreshes price/`last_seen` fields if `(retailer, sku)`
    /// already exists. Returns the stored row and whether it was newly inserted.
    fn upsert_product(
        &self,
        product: NewProduct,
    ) -> impl std::future::Future<Output = Result<(Product, bool), ProductStoreError>> + Send;

    /// Records the outcome of a successful live check: updates the product's price (when
    /// observed) and `last_live_verified`, and appends the audit snapshot. Both writes share one
    /// transaction; a failure in either rolls back both so a failed verification never corrupts
    /// product state.
    fn record_verification(
        &self,
        product_id: i64,
        observed_price: Option<f64>,
        verified_at: DateTime<Utc>,
        snapshot: NewLiveSnapshot,
    ) -> impl std::future::Future<Output = Result<(), ProductStoreError>> + Send;

    /// Closes the database connection.
    fn close(&mut self) -> impl std::future::Future<Output = Result<(), ProductStoreError>> + Send {
        async { Ok(()) }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ProductStoreError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("The requested product (internal id {0}) does not exist")]
    ProductNotFound(i64),
    #[error("A product already exists for retailer {retailer} with sku {sku}")]
    DuplicateProduct { retailer: Retailer, sku: String },
}

impl From<sqlx::Error> for ProductStoreError {
    fn from(e: sqlx::Error) -> Self {
        ProductStoreError::DatabaseError(e.to_string())
    }
}
