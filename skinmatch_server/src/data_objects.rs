use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skinmatch_engine::{verification::VerifiedCandidate, MatchOutcome};
use smg_common::pricing::format_price;

/// One verified product in the match response wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedProduct {
    pub id: String,
    pub retailer: String,
    pub retailer_sku: String,
    pub brand: String,
    pub name: String,
    pub country: String,
    pub currency: String,
    pub price: Option<f64>,
    pub price_per_ml: Option<f64>,
    pub formatted_price: Option<String>,
    pub pdp_url: String,
    pub image_url: Option<String>,
    pub ingredients_normalised: Vec<String>,
    pub availability: String,
    pub score: f64,
    pub last_verified: Option<DateTime<Utc>>,
}

impl From<VerifiedCandidate> for MatchedProduct {
    fn from(candidate: VerifiedCandidate) -> Self {
        let VerifiedCandidate { product, score, live } = candidate;
        let price = live.price.or(product.price);
        let currency = live.currency.clone().unwrap_or_else(|| product.currency.clone());
        let formatted_price = price.map(|amount| format_price(amount, &currency));
        Self {
            id: product.id.to_string(),
            retailer: product.retailer.to_string(),
            retailer_sku: product.retailer_sku,
            brand: product.brand,
            name: product.name,
            country: product.country,
            currency,
            price,
            price_per_ml: product.price_per_ml,
            formatted_price,
            pdp_url: product.pdp_url,
            image_url: product.image_url,
            ingredients_normalised: product.ingredients_norm,
            availability: live.in_stock.to_string(),
            score,
            last_verified: Some(live.fetched_at),
        }
    }
}

/// The match response body: verified products sorted by descending score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponseBody {
    pub generated_at: DateTime<Utc>,
    pub currency: String,
    pub results: Vec<MatchedProduct>,
}

impl From<MatchOutcome> for MatchResponseBody {
    fn from(outcome: MatchOutcome) -> Self {
        Self {
            generated_at: outcome.generated_at,
            currency: outcome.currency,
            results: outcome.results.into_iter().map(MatchedProduct::from).collect(),
        }
    }
}

/// Diagnostics for `GET /api/products/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductsHealthReport {
    pub service: String,
    pub status: String,
    pub adapters: Vec<AdapterStatus>,
    pub configuration: HealthConfiguration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterStatus {
    pub retailer: String,
    pub country: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfiguration {
    pub top_n_live_check: usize,
    pub live_check_timeout_secs: u64,
    pub supported_countries: Vec<String>,
}
