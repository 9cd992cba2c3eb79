//! Core data types shared between the matching engine, the database backends and the server.
//!
//! The types here mirror the product-store schema plus the transient request/result objects that
//! flow through a match. Anything that touches a database row lives in this module.
use std::{
    collections::HashSet,
    fmt::Display,
    str::FromStr,
};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};
use thiserror::Error;

//--------------------------------------      Retailer       ---------------------------------------------------------

/// A retailer identifier. Adapters are registered against these variants, so dispatch is checked
/// at the type level rather than via free-text comparison. Catalog rows with a retailer the engine
/// does not know about decode to [`Retailer::Other`] and are simply unverifiable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Retailer {
    Boots,
    Amazon,
    Superdrug,
    LookFantastic,
    Other(String),
}

impl Display for Retailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Retailer::Boots => write!(f, "boots"),
            Retailer::Amazon => write!(f, "amazon"),
            Retailer::Superdrug => write!(f, "superdrug"),
            Retailer::LookFantastic => write!(f, "lookfantastic"),
            Retailer::Other(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for Retailer {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let retailer = match s.to_lowercase().as_str() {
            "boots" => Retailer::Boots,
            "amazon" => Retailer::Amazon,
            "superdrug" => Retailer::Superdrug,
            "lookfantastic" => Retailer::LookFantastic,
            other => Retailer::Other(other.to_string()),
        };
        Ok(retailer)
    }
}

impl From<String> for Retailer {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(Retailer::Other(value))
    }
}

//--------------------------------------     StockStatus     ---------------------------------------------------------

/// Stock status as observed by a live check. `Unknown` covers both "the retailer did not say" and
/// "we have not asked recently".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    OutOfStock,
    Unknown,
}

impl Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockStatus::InStock => write!(f, "in_stock"),
            StockStatus::OutOfStock => write!(f, "out_of_stock"),
            StockStatus::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid stock status: {0}")]
pub struct StockStatusConversionError(String);

impl FromStr for StockStatus {
    type Err = StockStatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_stock" => Ok(Self::InStock),
            "out_of_stock" => Ok(Self::OutOfStock),
            "unknown" => Ok(Self::Unknown),
            s => Err(StockStatusConversionError(s.to_string())),
        }
    }
}

impl From<String> for StockStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid stock status in database: {value}. Defaulting to unknown.");
            StockStatus::Unknown
        })
    }
}

//--------------------------------------    SnapshotSource   ---------------------------------------------------------

/// Where a verification result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    /// A generic live check against the retailer.
    LiveCheck,
    /// A live check performed by scraping the retailer's site.
    Scrape,
    /// A live check performed against a retailer API.
    Api,
    /// Synthesized from a recently verified product row, no network involved.
    Database,
}

impl Display for SnapshotSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotSource::LiveCheck => write!(f, "live_check"),
            SnapshotSource::Scrape => write!(f, "scrape"),
            SnapshotSource::Api => write!(f, "api"),
            SnapshotSource::Database => write!(f, "database"),
        }
    }
}

impl From<String> for SnapshotSource {
    fn from(value: String) -> Self {
        match value.as_str() {
            "live_check" => Self::LiveCheck,
            "scrape" => Self::Scrape,
            "api" => Self::Api,
            "database" => Self::Database,
            _ => {
                error!("Invalid snapshot source in database: {value}. Defaulting to live_check.");
                Self::LiveCheck
            },
        }
    }
}

//--------------------------------------       Product       ---------------------------------------------------------

/// A catalog entry. Created and refreshed by the catalog-ingestion collaborator; the matching
/// engine reads rows and only ever writes back `price` and `last_live_verified` after a
/// successful live check.
///
/// `(retailer, retailer_sku)` is globally unique. `ingredients_norm` preserves INCI declaration
/// order; `ingredient_set` is the same tokens as a set, rebuilt on row decode for fast membership
/// tests.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: i64,
    pub retailer: Retailer,
    pub retailer_sku: String,
    pub brand: String,
    pub name: String,
    pub country: String,
    pub currency: String,
    pub price: Option<f64>,
    pub price_per_ml: Option<f64>,
    pub pdp_url: String,
    pub image_url: Option<String>,
    pub ingredients_raw: String,
    pub ingredients_norm: Vec<String>,
    ingredient_set: HashSet<String>,
    pub last_seen: DateTime<Utc>,
    pub last_live_verified: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Builds an in-memory product from its insert form, e.g. for fixtures or for callers that
    /// need a `Product` before the store has assigned it a row id.
    pub fn from_new(id: i64, new: NewProduct) -> Self {
        let ingredient_set = new.ingredients_norm.iter().cloned().collect();
        Self {
            id,
            retailer: new.retailer,
            retailer_sku: new.retailer_sku,
            brand: new.brand,
            name: new.name,
            country: new.country,
            currency: new.currency,
            price: new.price,
            price_per_ml: new.price_per_ml,
            pdp_url: new.pdp_url,
            image_url: new.image_url,
            ingredients_raw: new.ingredients_raw,
            ingredients_norm: new.ingredients_norm,
            ingredient_set,
            last_seen: new.last_seen,
            last_live_verified: new.last_live_verified,
            created_at: new.last_seen,
            updated_at: new.last_seen,
        }
    }

    /// Set view over the ordered ingredient sequence.
    pub fn ingredient_set(&self) -> &HashSet<String> {
        &self.ingredient_set
    }

    /// True if the product was live-verified within `window` of `now`.
    pub fn verified_within(&self, window: chrono::Duration, now: DateTime<Utc>) -> bool {
        self.last_live_verified.map(|at| now - at <= window).unwrap_or(false)
    }
}

impl FromRow<'_, SqliteRow> for Product {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let retailer: String = row.try_get("retailer")?;
        let ingredients_json: String = row.try_get("ingredients_norm")?;
        let ingredients_norm: Vec<String> = serde_json::from_str(&ingredients_json).unwrap_or_else(|e| {
            error!("Corrupt ingredients_norm column for product row: {e}. Treating as empty.");
            Vec::new()
        });
        let ingredient_set = ingredients_norm.iter().cloned().collect();
        Ok(Self {
            id: row.try_get("id")?,
            retailer: Retailer::from(retailer),
            retailer_sku: row.try_get("retailer_sku")?,
            brand: row.try_get("brand")?,
            name: row.try_get("name")?,
            country: row.try_get("country")?,
            currency: row.try_get("currency")?,
            price: row.try_get("price")?,
            price_per_ml: row.try_get("price_per_ml")?,
            pdp_url: row.try_get("pdp_url")?,
            image_url: row.try_get("image_url")?,
            ingredients_raw: row.try_get("ingredients_raw")?,
            ingredients_norm,
            ingredient_set,
            last_seen: row.try_get("last_seen")?,
            last_live_verified: row.try_get("last_live_verified")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

//--------------------------------------      NewProduct     ---------------------------------------------------------

/// Insert form for a catalog entry. Used by the ingestion collaborator and by test fixtures.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub retailer: Retailer,
    pub retailer_sku: String,
    pub brand: String,
    pub name: String,
    pub country: String,
    pub currency: String,
    pub price: Option<f64>,
    pub price_per_ml: Option<f64>,
    pub pdp_url: String,
    pub image_url: Option<String>,
    pub ingredients_raw: String,
    pub ingredients_norm: Vec<String>,
    pub last_seen: DateTime<Utc>,
    pub last_live_verified: Option<DateTime<Utc>>,
}

impl NewProduct {
    pub fn new(retailer: Retailer, retailer_sku: impl Into<String>, name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            retailer,
            retailer_sku: retailer_sku.into(),
            brand: String::new(),
            name: name.into(),
            country: country.into(),
            currency: "GBP".to_string(),
            price: None,
            price_per_ml: None,
            pdp_url: String::new(),
            image_url: None,
            ingredients_raw: String::new(),
            ingredients_norm: Vec::new(),
            last_seen: Utc::now(),
            last_live_verified: None,
        }
    }
}

//--------------------------------------     LiveSnapshot    ---------------------------------------------------------

/// An immutable audit record of one live-verification attempt. Written exactly once, never read
/// back by the matching path.
#[derive(Debug, Clone)]
pub struct LiveSnapshot {
    pub id: i64,
    pub product_id: i64,
    pub fetched_at: DateTime<Utc>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub in_stock: StockStatus,
    pub deliverable_postcode: Option<String>,
    pub ingredients_raw: Option<String>,
    pub status_code: Option<String>,
    pub source: SnapshotSource,
}

impl FromRow<'_, SqliteRow> for LiveSnapshot {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let in_stock: String = row.try_get("in_stock")?;
        let source: String = row.try_get("source")?;
        Ok(Self {
            id: row.try_get("id")?,
            product_id: row.try_get("product_id")?,
            fetched_at: row.try_get("fetched_at")?,
            price: row.try_get("price")?,
            currency: row.try_get("currency")?,
            in_stock: StockStatus::from(in_stock),
            deliverable_postcode: row.try_get("deliverable_postcode")?,
            ingredients_raw: row.try_get("ingredients_raw")?,
            status_code: row.try_get("status_code")?,
            source: SnapshotSource::from(source),
        })
    }
}

/// Insert form for a [`LiveSnapshot`].
#[derive(Debug, Clone)]
pub struct NewLiveSnapshot {
    pub product_id: i64,
    pub fetched_at: DateTime<Utc>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub in_stock: StockStatus,
    pub deliverable_postcode: Option<String>,
    pub ingredients_raw: Option<String>,
    pub status_code: Option<String>,
    pub source: SnapshotSource,
}

//--------------------------------------      Location       ---------------------------------------------------------

/// Optional buyer location attached to a match request. Only the postcode participates in
/// verification; coordinates are carried through for future delivery-radius work.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Location {
    pub postcode: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

//--------------------------------------    MatchRequest     ---------------------------------------------------------

/// A buyer's matching request. Immutable once validated by the match flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequest {
    pub country: String,
    #[serde(default)]
    pub location: Option<Location>,
    pub required_ingredients: Vec<String>,
    #[serde(default)]
    pub avoid_ingredients: Vec<String>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl MatchRequest {
    pub fn postcode(&self) -> Option<&str> {
        self.location.as_ref().and_then(|l| l.postcode.as_deref())
    }
}

//--------------------------------------   ScoredCandidate   ---------------------------------------------------------

/// A product with its relevance score. Transient: produced by the scorer, consumed by the
/// orchestrator, never persisted.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub product: Product,
    pub score: f64,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn retailer_round_trips_known_names() {
        assert_eq!(Retailer::from("Boots".to_string()), Retailer::Boots);
        assert_eq!(Retailer::from("amazon".to_string()), Retailer::Amazon);
        assert_eq!(Retailer::Boots.to_string(), "boots");
    }

    #[test]
    fn unknown_retailer_is_preserved() {
        let r = Retailer::from("cult_beauty".to_string());
        assert_eq!(r, Retailer::Other("cult_beauty".to_string()));
        assert_eq!(r.to_string(), "cult_beauty");
    }

    #[test]
    fn stock_status_parses_wire_format() {
        assert_eq!("in_stock".parse::<StockStatus>().unwrap(), StockStatus::InStock);
        assert_eq!(StockStatus::from("garbage".to_string()), StockStatus::Unknown);
        assert_eq!(StockStatus::OutOfStock.to_string(), "out_of_stock");
    }

    #[test]
    fn match_request_deserializes_with_defaults() {
        let req: MatchRequest = serde_json::from_str(
            r#"{ "country": "GB", "required_ingredients": ["niacinamide"] }"#,
        )
        .unwrap();
        assert!(req.avoid_ingredients.is_empty());
        assert!(req.max_price.is_none());
        assert!(req.postcode().is_none());
    }
}
