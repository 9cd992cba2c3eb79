use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{LiveSnapshot, NewLiveSnapshot},
    traits::ProductStoreError,
};

/// Appends one immutable audit record. Snapshots are insert-only; nothing in the engine ever
/// updates or deletes them.
pub async fn insert_snapshot(snapshot: NewLiveSnapshot, conn: &mut SqliteConnection) -> Result<i64, ProductStoreError> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
            INSERT INTO live_snapshots (
                product_id,
                fetched_at,
                price,
                currency,
                in_stock,
                deliverable_postcode,
                ingredients_raw,
                status_code,
                source
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id;
        "#,
    )
    .bind(snapshot.product_id)
    .bind(snapshot.fetched_at)
    .bind(snapshot.price)
    .bind(snapshot.currency)
    .bind(snapshot.in_stock.to_string())
    .bind(snapshot.deliverable_postcode)
    .bind(snapshot.ingredients_raw)
    .bind(snapshot.status_code)
    .bind(snapshot.source.to_string())
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Snapshot {id} recorded for product {}", snapshot.product_id);
    Ok(id)
}

/// The audit trail for one product, oldest first.
pub async fn snapshots_for_product(
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<LiveSnapshot>, sqlx::Error> {
    let snapshots = sqlx::query_as("SELECT * FROM live_snapshots WHERE product_id = $1 ORDER BY fetched_at ASC")
        .bind(product_id)
        .fetch_all(conn)
        .await?;
    Ok(snapshots)
}
