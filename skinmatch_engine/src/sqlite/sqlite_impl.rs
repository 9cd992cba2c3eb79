//! `SqliteDatabase` is the concrete SQLite product store.
//!
//! It implements [`ProductStore`] on top of the low-level functions in [`super::db`]. The one
//! piece of logic that lives here rather than in the query modules is transaction composition:
//! the price write-back and the audit snapshot always commit or roll back together.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqlitePool;

use super::db::{new_pool, products, snapshots};
use crate::{
    db_types::{NewLiveSnapshot, NewProduct, Product, Retailer},
    traits::{ProductStore, ProductStoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, ProductStoreError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl ProductStore for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_candidates(&self, country: &str, max_price: Option<f64>) -> Result<Vec<Product>, ProductStoreError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_candidates(country, max_price, &mut conn).await
    }

    async fn fetch_product_by_id(&self, id: i64) -> Result<Option<Product>, ProductStoreError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product_by_id(id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_product_by_sku(
        &self,
        retailer: &Retailer,
        retailer_sku: &str,
    ) -> Result<Option<Product>, ProductStoreError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product_by_sku(retailer, retailer_sku, &mut conn).await?;
        Ok(product)
    }

    async fn upsert_product(&self, product: NewProduct) -> Result<(Product, bool), ProductStoreError> {
        let mut conn = self.pool.acquire().await?;
        products::idempotent_insert(product, &mut conn).await
    }

    async fn record_verification(
        &self,
        product_id: i64,
        observed_price: Option<f64>,
        verified_at: DateTime<Utc>,
        snapshot: NewLiveSnapshot,
    ) -> Result<(), ProductStoreError> {
        let mut tx = self.pool.begin().await?;
        products::update_verification(product_id, observed_price, verified_at, &mut tx).await?;
        snapshots::insert_snapshot(snapshot, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Verification recorded for product {product_id}");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ProductStoreError> {
        self.pool.close().await;
        Ok(())
    }
}
