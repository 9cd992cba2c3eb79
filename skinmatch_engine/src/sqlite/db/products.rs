use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewProduct, Product, Retailer},
    traits::ProductStoreError,
};

/// Fetches products for `country`, excluding those with a known price above `max_price`
/// (unknown prices pass through), freshest first. The ingredient policy is the caller's job.
pub async fn fetch_candidates(
    country: &str,
    max_price: Option<f64>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, ProductStoreError> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM products WHERE country = ");
    builder.push_bind(country);
    if let Some(cap) = max_price {
        builder.push(" AND (price IS NULL OR price <= ");
        builder.push_bind(cap);
        builder.push(")");
    }
    builder.push(" ORDER BY last_seen DESC");
    trace!("🗃️ Executing candidate query: {}", builder.sql());
    let products = builder.build_query_as::<Product>().fetch_all(conn).await?;
    Ok(products)
}

pub async fn fetch_product_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn fetch_product_by_sku(
    retailer: &Retailer,
    retailer_sku: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE retailer = $1 AND retailer_sku = $2")
        .bind(retailer.to_string())
        .bind(retailer_sku)
        .fetch_optional(conn)
        .await?;
    Ok(product)
}

/// Inserts the product, or refreshes the catalog fields of the existing `(retailer, sku)` row.
/// Returns `false` in the second element if the product already existed.
pub async fn idempotent_insert(
    product: NewProduct,
    conn: &mut SqliteConnection,
) -> Result<(Product, bool), ProductStoreError> {
    match fetch_product_by_sku(&product.retailer, &product.retailer_sku, &mut *conn).await? {
        Some(existing) => {
            let refreshed = refresh_product(existing.id, &product, conn).await?;
            debug!("🗃️ Product [{}/{}] refreshed", refreshed.retailer, refreshed.retailer_sku);
            Ok((refreshed, false))
        },
        None => {
            let product = insert_product(product, conn).await?;
            debug!("🗃️ Product [{}/{}] inserted with id {}", product.retailer, product.retailer_sku, product.id);
            Ok((product, true))
        },
    }
}

async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, ProductStoreError> {
    let ingredients_norm = serde_json::to_string(&product.ingredients_norm).unwrap_or_else(|_| "[]".to_string());
    let row = sqlx::query_as(
        r#"
            INSERT INTO products (
                retailer,
                retailer_sku,
                brand,
                name,
                country,
                currency,
                price,
                price_per_ml,
                pdp_url,
                image_url,
                ingredients_raw,
                ingredients_norm,
                last_seen,
                last_live_verified
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *;
        "#,
    )
    .bind(product.retailer.to_string())
    .bind(product.retailer_sku)
    .bind(product.brand)
    .bind(product.name)
    .bind(product.country)
    .bind(product.currency)
    .bind(product.price)
    .bind(product.price_per_ml)
    .bind(product.pdp_url)
    .bind(product.image_url)
    .bind(product.ingredients_raw)
    .bind(ingredients_norm)
    .bind(product.last_seen)
    .bind(product.last_live_verified)
    .fetch_one(conn)
    .await?;
    Ok(row)
}

async fn refresh_product(id: i64, product: &NewProduct, conn: &mut SqliteConnection) -> Result<Product, ProductStoreError> {
    let ingredients_norm = serde_json::to_string(&product.ingredients_norm).unwrap_or_else(|_| "[]".to_string());
    let row = sqlx::query_as(
        r#"
            UPDATE products SET
                brand = $2,
                name = $3,
                currency = $4,
                price = $5,
                price_per_ml = $6,
                pdp_url = $7,
                image_url = $8,
                ingredients_raw = $9,
                ingredients_norm = $10,
                last_seen = $11,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(&product.brand)
    .bind(&product.name)
    .bind(&product.currency)
    .bind(product.price)
    .bind(product.price_per_ml)
    .bind(&product.pdp_url)
    .bind(&product.image_url)
    .bind(&product.ingredients_raw)
    .bind(ingredients_norm)
    .bind(product.last_seen)
    .fetch_one(conn)
    .await?;
    Ok(row)
}

/// Writes the outcome of a successful live check back onto the product row. A `None` price
/// leaves the stored price untouched.
pub async fn update_verification(
    product_id: i64,
    observed_price: Option<f64>,
    verified_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), ProductStoreError> {
    let result = sqlx::query(
        r#"
            UPDATE products SET
                price = COALESCE($2, price),
                last_live_verified = $3,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
        "#,
    )
    .bind(product_id)
    .bind(observed_price)
    .bind(verified_at)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ProductStoreError::ProductNotFound(product_id));
    }
    Ok(())
}
