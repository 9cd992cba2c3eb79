//! API-backed Amazon adapter using the Rainforest product API.
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::*;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use skinmatch_engine::{
    db_types::{Product, Retailer, SnapshotSource, StockStatus},
    traits::{AdapterError, LiveResult, ParsedDetail, ProductSeed, RetailerAdapter},
};

use crate::{config::RainforestConfig, throttle::RequestThrottle};

const RAINFOREST_URL: &str = "https://api.rainforestapi.com/request";
const MAX_CONCURRENT_REQUESTS: usize = 5;
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(200);

pub struct RainforestAdapter {
    config: RainforestConfig,
    client: Client,
    throttle: RequestThrottle,
    asin_re: Regex,
    price_re: Regex,
    volume_re: Regex,
}

impl RainforestAdapter {
    pub fn new(config: RainforestConfig) -> Result<Self, AdapterError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AdapterError::NotConfigured(e.to_string()))?;
        Ok(Self {
            config,
            client,
            throttle: RequestThrottle::new(MAX_CONCURRENT_REQUESTS, MIN_REQUEST_INTERVAL),
            asin_re: Regex::new(r"/dp/([A-Z0-9]{10})").expect("invalid ASIN pattern"),
            price_re: Regex::new(r"[\d,]+\.?\d*").expect("invalid price pattern"),
            volume_re: Regex::new(r"(\d+)\s*ml").expect("invalid volume pattern"),
        })
    }

    /// Pulls the ASIN out of an amazon URL, or passes a bare SKU through.
    fn asin_from(&self, url_or_sku: &str) -> String {
        if url_or_sku.contains("amazon.") {
            if let Some(captures) = self.asin_re.captures(url_or_sku) {
                return captures[1].to_string();
            }
        }
        url_or_sku.to_string()
    }

    fn price_from_string(&self, price_string: &str) -> Option<f64> {
        self.price_re.find(price_string).and_then(|m| m.as_str().replace(',', "").parse().ok())
    }

    fn volume_from_title(&self, title: &str) -> Option<f64> {
        self.volume_re.captures(&title.to_lowercase()).and_then(|c| c[1].parse().ok())
    }

    fn currency(&self) -> String {
        if self.country() == "US" { "USD".to_string() } else { "GBP".to_string() }
    }

    async fn api_request<T: serde::de::DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T, AdapterError> {
        let _permit = self.throttle.acquire().await?;
        let response = self
            .client
            .get(RAINFOREST_URL)
            .query(&[("api_key", self.config.api_key.reveal().as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| AdapterError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AdapterError::Status(response.status().as_u16()));
        }
        response.json::<T>().await.map_err(|e| AdapterError::Parse(e.to_string()))
    }
}

#[async_trait]
impl RetailerAdapter for RainforestAdapter {
    fn retailer(&self) -> Retailer {
        Retailer::Amazon
    }

    fn country(&self) -> &str {
        match self.config.amazon_domain.as_str() {
            "amazon.com" => "US",
            "amazon.de" => "DE",
            "amazon.fr" => "FR",
            _ => "GB",
        }
    }

    async fn search(&self, query: &str, _country: &str) -> Result<Vec<ProductSeed>, AdapterError> {
        if !self.config.is_configured() {
            warn!("📡 Rainforest API key not configured, returning no Amazon search results");
            return Ok(Vec::new());
        }
        let result: SearchResponse = self
            .api_request(&[
                ("type", "search"),
                ("amazon_domain", self.config.amazon_domain.as_str()),
                ("search_term", query),
                ("department", "beauty"),
                ("max_page", "1"),
            ])
            .await?;
        let currency = self.currency();
        let seeds: Vec<ProductSeed> = result
            .search_results
            .into_iter()
            .filter_map(|item| {
                let price = item
                    .price
                    .as_ref()
                    .and_then(|p| p.value)
                    .or_else(|| item.price_string.as_deref().and_then(|s| self.price_from_string(s)));
                let brand = item.title.split_whitespace().next().unwrap_or("Amazon").to_string();
                let seed = ProductSeed {
                    retailer_sku: item.asin.unwrap_or_default(),
                    name: item.title,
                    brand,
                    price,
                    currency: currency.clone(),
                    pdp_url: item.link.unwrap_or_default(),
                    image_url: item.image,
                    gtin: None,
                };
                (!seed.retailer_sku.is_empty() && !seed.name.is_empty()).then_some(seed)
            })
            .collect();
        info!("📡 Amazon search for '{query}' returned {} products", seeds.len());
        Ok(seeds)
    }

    async fn fetch_detail_page(&self, url_or_sku: &str) -> Result<ParsedDetail, AdapterError> {
        if !self.config.is_configured() {
            return Err(AdapterError::NotConfigured("Rainforest API key not set".to_string()));
        }
        let asin = self.asin_from(url_or_sku);
        let result: ProductResponse = self
            .api_request(&[
                ("type", "product"),
                ("amazon_domain", self.config.amazon_domain.as_str()),
                ("asin", asin.as_str()),
            ])
            .await?;
        let data = result.product.ok_or_else(|| AdapterError::Parse(format!("no product data for ASIN {asin}")))?;

        // Ingredients arrive in whichever of these fields the listing populated first.
        let ingredients_raw = data
            .ingredients
            .clone()
            .or_else(|| data.description.clone())
            .or_else(|| data.feature_bullets.as_ref().map(|bullets| bullets.join(" ")))
            .unwrap_or_default();
        let availability = match data.availability.as_ref().and_then(|a| a.r#type.as_deref()) {
            Some(status) if status.to_lowercase().contains("in_stock") || status.to_lowercase().contains("in stock") => {
                StockStatus::InStock
            },
            Some(status) if status.to_lowercase().contains("out_of_stock") || status.to_lowercase().contains("out of stock") => {
                StockStatus::OutOfStock
            },
            _ => StockStatus::Unknown,
        };
        let title = data.title.unwrap_or_default();
        Ok(ParsedDetail {
            volume_ml: self.volume_from_title(&title),
            name: title,
            brand: data.brand.unwrap_or_default(),
            price: data.buybox_winner.and_then(|b| b.price).and_then(|p| p.value),
            currency: self.currency(),
            ingredients_raw,
            image_url: data.main_image.and_then(|i| i.link),
            gtin: None,
            availability,
        })
    }

    async fn live_check(&self, product: &Product, postcode: Option<&str>) -> LiveResult {
        if !self.config.is_configured() {
            warn!("📡 Rainforest API key not configured, cannot verify {}", product.retailer_sku);
            return LiveResult::error(postcode.map(str::to_string), SnapshotSource::Api);
        }
        match self.fetch_detail_page(&product.retailer_sku).await {
            Ok(detail) => LiveResult {
                price: detail.price,
                currency: Some(detail.currency),
                in_stock: detail.availability,
                deliverable_postcode: postcode.map(str::to_string),
                ingredients_raw: (!detail.ingredients_raw.is_empty()).then_some(detail.ingredients_raw),
                status_code: "200".to_string(),
                fetched_at: Utc::now(),
                source: SnapshotSource::Api,
            },
            Err(e) => {
                error!("📡 Amazon live check failed for {}: {e}", product.retailer_sku);
                LiveResult::error(postcode.map(str::to_string), SnapshotSource::Api)
            },
        }
    }
}

//--------------------------------------  Rainforest wire types  ------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    search_results: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    asin: Option<String>,
    #[serde(default)]
    title: String,
    link: Option<String>,
    image: Option<String>,
    price: Option<PriceInfo>,
    price_string: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PriceInfo {
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    product: Option<ProductData>,
}

#[derive(Debug, Deserialize)]
struct ProductData {
    title: Option<String>,
    brand: Option<String>,
    description: Option<String>,
    feature_bullets: Option<Vec<String>>,
    ingredients: Option<String>,
    buybox_winner: Option<BuyboxWinner>,
    main_image: Option<ImageInfo>,
    availability: Option<Availability>,
}

#[derive(Debug, Deserialize)]
struct BuyboxWinner {
    price: Option<PriceInfo>,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Availability {
    r#type: Option<String>,
}

#[cfg(test)]
mod test {
    use smg_common::Secret;

    use super::*;

    fn adapter() -> RainforestAdapter {
        let config = RainforestConfig { api_key: Secret::new("test-key".to_string()), ..Default::default() };
        RainforestAdapter::new(config).unwrap()
    }

    #[test]
    fn asin_extraction_handles_urls_and_bare_skus() {
        let a = adapter();
        assert_eq!(a.asin_from("https://www.amazon.co.uk/dp/B01MSSDEPK?th=1"), "B01MSSDEPK");
        assert_eq!(a.asin_from("B01MSSDEPK"), "B01MSSDEPK");
    }

    #[test]
    fn price_string_fallback_parses_amounts() {
        let a = adapter();
        assert_eq!(a.price_from_string("£19.99"), Some(19.99));
        assert_eq!(a.price_from_string("£1,299.00"), Some(1299.0));
        assert_eq!(a.price_from_string("currently unavailable"), None);
    }

    #[test]
    fn volume_is_read_from_the_title() {
        let a = adapter();
        assert_eq!(a.volume_from_title("The Ordinary Niacinamide 10% + Zinc 1% 30ml"), Some(30.0));
        assert_eq!(a.volume_from_title("CeraVe Hydrating Cleanser 473 ml"), Some(473.0));
        assert_eq!(a.volume_from_title("Face mask, pack of 5"), None);
    }

    #[test]
    fn search_results_deserialize_with_price_variants() {
        let json = r#"{
            "search_results": [
                { "asin": "B01MSSDEPK", "title": "The Ordinary Niacinamide 10%", "link": "https://www.amazon.co.uk/dp/B01MSSDEPK",
                  "image": "https://m.media-amazon.com/x.jpg", "price": { "value": 5.0 } },
                { "asin": "B07DPM3V43", "title": "CeraVe Foaming Cleanser", "price_string": "£9.50" },
                { "title": "Listing with no ASIN" }
            ]
        }"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.search_results.len(), 3);
        assert_eq!(response.search_results[0].price.as_ref().unwrap().value, Some(5.0));
        assert_eq!(response.search_results[1].price_string.as_deref(), Some("£9.50"));
        assert!(response.search_results[2].asin.is_none());
    }

    #[test]
    fn country_follows_the_configured_domain() {
        let mut config = RainforestConfig { api_key: Secret::new("k".to_string()), ..Default::default() };
        config.amazon_domain = "amazon.com".to_string();
        let a = RainforestAdapter::new(config).unwrap();
        assert_eq!(a.country(), "US");
        assert_eq!(a.currency(), "USD");
        assert_eq!(adapter().country(), "GB");
    }
}
