use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{
    db_types::{NewLiveSnapshot, NewProduct, Product, Retailer, SnapshotSource, StockStatus},
    traits::{AdapterError, LiveResult, ParsedDetail, ProductSeed, ProductStore, ProductStoreError, RetailerAdapter},
};

//--------------------------------------     StubAdapter     ---------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum StubOutcome {
    InStock(f64),
    Error,
}

/// A scripted retailer adapter: returns a fixed live-check outcome and counts invocations.
pub struct StubAdapter {
    retailer: Retailer,
    outcome: StubOutcome,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl StubAdapter {
    /// An adapter whose live checks always succeed with the given price.
    pub fn in_stock(retailer: Retailer, price: f64) -> Self {
        Self { retailer, outcome: StubOutcome::InStock(price), delay: None, calls: Arc::new(AtomicUsize::new(0)) }
    }

    /// An adapter whose live checks always come back with an error status.
    pub fn erroring(retailer: Retailer) -> Self {
        Self { retailer, outcome: StubOutcome::Error, delay: None, calls: Arc::new(AtomicUsize::new(0)) }
    }

    /// Makes every live check sleep first, for deadline tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared live-check invocation counter.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl RetailerAdapter for StubAdapter {
    fn retailer(&self) -> Retailer {
        self.retailer.clone()
    }

    fn country(&self) -> &str {
        "GB"
    }

    async fn search(&self, _query: &str, _country: &str) -> Result<Vec<ProductSeed>, AdapterError> {
        Ok(Vec::new())
    }

    async fn fetch_detail_page(&self, url_or_sku: &str) -> Result<ParsedDetail, AdapterError> {
        Err(AdapterError::NotConfigured(format!("stub adapter cannot fetch {url_or_sku}")))
    }

    async fn live_check(&self, _product: &Product, postcode: Option<&str>) -> LiveResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.outcome {
            StubOutcome::InStock(price) => LiveResult {
                price: Some(price),
                currency: Some("GBP".to_string()),
                in_stock: StockStatus::InStock,
                deliverable_postcode: postcode.map(str::to_string),
                ingredients_raw: None,
                status_code: "200".to_string(),
                fetched_at: Utc::now(),
                source: SnapshotSource::LiveCheck,
            },
            StubOutcome::Error => LiveResult::error(postcode.map(str::to_string), SnapshotSource::LiveCheck),
        }
    }
}

//--------------------------------------    InMemoryStore    ---------------------------------------------------------

/// A `ProductStore` double backed by a `Vec`, recording every verification write.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    products: Arc<Mutex<Vec<Product>>>,
    verifications: Arc<Mutex<Vec<(i64, Option<f64>, DateTime<Utc>)>>>,
    snapshots: Arc<Mutex<Vec<NewLiveSnapshot>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product, assigning the next row id.
    pub async fn seed(&self, new: NewProduct) -> Product {
        let mut products = self.products.lock().await;
        let id = products.len() as i64 + 1;
        let product = Product::from_new(id, new);
        products.push(product.clone());
        product
    }

    pub async fn recorded_verifications(&self) -> Vec<(i64, Option<f64>, DateTime<Utc>)> {
        self.verifications.lock().await.clone()
    }

    pub async fn recorded_snapshots(&self) -> Vec<NewLiveSnapshot> {
        self.snapshots.lock().await.clone()
    }
}

impl ProductStore for InMemoryStore {
    fn url(&self) -> &str {
        "memory://test"
    }

    async fn fetch_candidates(&self, country: &str, max_price: Option<f64>) -> Result<Vec<Product>, ProductStoreError> {
        let products = self.products.lock().await;
        let mut matching: Vec<Product> = products
            .iter()
            .filter(|p| p.country == country)
            .filter(|p| match (max_price, p.price) {
                (Some(cap), Some(price)) => price <= cap,
                _ => true,
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        Ok(matching)
    }

    async fn fetch_product_by_id(&self, id: i64) -> Result<Option<Product>, ProductStoreError> {
        Ok(self.products.lock().await.iter().find(|p| p.id == id).cloned())
    }

    async fn fetch_product_by_sku(
        &self,
        retailer: &Retailer,
        retailer_sku: &str,
    ) -> Result<Option<Product>, ProductStoreError> {
        Ok(self
            .products
            .lock()
            .await
            .iter()
            .find(|p| &p.retailer == retailer && p.retailer_sku == retailer_sku)
            .cloned())
    }

    async fn upsert_product(&self, product: NewProduct) -> Result<(Product, bool), ProductStoreError> {
        if let Some(existing) = self.fetch_product_by_sku(&product.retailer, &product.retailer_sku).await? {
            return Ok((existing, false));
        }
        Ok((self.seed(product).await, true))
    }

    async fn record_verification(
        &self,
        product_id: i64,
        observed_price: Option<f64>,
        verified_at: DateTime<Utc>,
        snapshot: NewLiveSnapshot,
    ) -> Result<(), ProductStoreError> {
        {
            let mut products = self.products.lock().await;
            let product = products
                .iter_mut()
                .find(|p| p.id == product_id)
                .ok_or(ProductStoreError::ProductNotFound(product_id))?;
            if let Some(price) = observed_price {
                product.price = Some(price);
            }
            product.last_live_verified = Some(verified_at);
        }
        self.verifications.lock().await.push((product_id, observed_price, verified_at));
        self.snapshots.lock().await.push(snapshot);
        Ok(())
    }
}
