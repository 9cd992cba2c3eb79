//! Scrape-backed boots.com adapter.
//!
//! HTML parsing happens in synchronous helpers so the parsed document never lives across an
//! `.await` (the parser's DOM is not `Send`).
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::*;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use skinmatch_engine::{
    db_types::{Product, Retailer, SnapshotSource, StockStatus},
    traits::{AdapterError, LiveResult, ParsedDetail, ProductSeed, RetailerAdapter},
};

use crate::{config::BootsConfig, throttle::RequestThrottle};

const MAX_CONCURRENT_REQUESTS: usize = 3;
// Polite scraping pace.
const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(1);
const MAX_SEARCH_SEEDS: usize = 20;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/91.0.4472.124 Safari/537.36";

pub struct BootsAdapter {
    config: BootsConfig,
    client: Client,
    throttle: RequestThrottle,
    price_re: Regex,
    sku_re: Regex,
    volume_re: Regex,
    ingredients_re: Regex,
}

impl BootsAdapter {
    pub fn new(config: BootsConfig) -> Result<Self, AdapterError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AdapterError::NotConfigured(e.to_string()))?;
        Ok(Self {
            config,
            client,
            throttle: RequestThrottle::new(MAX_CONCURRENT_REQUESTS, MIN_REQUEST_INTERVAL),
            price_re: Regex::new(r"£(\d+(?:\.\d{2})?)").expect("invalid price pattern"),
            sku_re: Regex::new(r"/(\d+)/?$").expect("invalid sku pattern"),
            volume_re: Regex::new(r"(\d+)\s*ml").expect("invalid volume pattern"),
            ingredients_re: Regex::new(r"ingredients[:\s]+([^.]+)").expect("invalid ingredients pattern"),
        })
    }

    async fn fetch_html(&self, url: &str) -> Result<String, AdapterError> {
        let _permit = self.throttle.acquire().await?;
        let response = self.client.get(url).send().await.map_err(|e| AdapterError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AdapterError::Status(response.status().as_u16()));
        }
        response.text().await.map_err(|e| AdapterError::Http(e.to_string()))
    }

    /// Extracts a GBP amount from text like `£19.99` or `£1.99 - £19.99` (first amount wins).
    fn extract_price(&self, text: &str) -> Option<f64> {
        let cleaned = text.replace(',', "");
        self.price_re.captures(&cleaned).and_then(|c| c[1].parse().ok())
    }

    fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http") {
            href.to_string()
        } else {
            format!("{}{}", self.config.base_url.trim_end_matches('/'), href)
        }
    }

    fn parse_search(&self, html: &str) -> Vec<ProductSeed> {
        let document = Html::parse_document(html);
        let tile_sel = selector(".product-tile, .estore_product_tile, .product-item");
        let name_sel = selector(".product-name, .product-title, .estore_product_name");
        let brand_sel = selector(".product-brand, .brand-name, .estore_brand");
        let price_sel = selector(".price, .product-price, .estore_price");
        let link_sel = selector("a");
        let img_sel = selector("img");

        let mut seeds = Vec::new();
        for tile in document.select(&tile_sel).take(MAX_SEARCH_SEEDS) {
            let name = tile.select(&name_sel).next().map(|e| clean_text(&e.text().collect::<String>())).unwrap_or_default();
            let brand = tile
                .select(&brand_sel)
                .next()
                .map(|e| clean_text(&e.text().collect::<String>()))
                .unwrap_or_else(|| name.split_whitespace().next().unwrap_or("Boots").to_string());
            let price = tile.select(&price_sel).next().and_then(|e| self.extract_price(&e.text().collect::<String>()));
            let pdp_url = tile
                .select(&link_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(|href| self.absolute_url(href))
                .unwrap_or_default();
            let image_url = tile
                .select(&img_sel)
                .next()
                .and_then(|img| img.value().attr("src"))
                .map(|src| self.absolute_url(src));
            let retailer_sku = self
                .sku_re
                .captures(&pdp_url)
                .map(|c| c[1].to_string())
                .or_else(|| tile.value().attr("data-product-id").map(str::to_string))
                .unwrap_or_default();

            if !name.is_empty() && !retailer_sku.is_empty() && !pdp_url.is_empty() {
                seeds.push(ProductSeed {
                    retailer_sku,
                    name,
                    brand,
                    price,
                    currency: "GBP".to_string(),
                    pdp_url,
                    image_url,
                    gtin: None,
                });
            }
        }
        seeds
    }

    fn parse_detail(&self, html: &str) -> ParsedDetail {
        let document = Html::parse_document(html);
        let name_sel = selector("h1.product-name, h1.pdp-product-name, .product-title h1");
        let brand_sel = selector(".product-brand, .brand-name, .pdp-brand");
        let price_sel = selector(".price, .product-price, .current-price");
        let ingredients_sel = selector(".ingredients, .product-ingredients, .ingredient-list");
        let detail_sel = selector(".product-details, .product-description, .pdp-description");
        let img_sel = selector(".product-image img, .pdp-image img");
        let stock_sel = selector(".stock-status, .availability, .product-availability");

        let name = document.select(&name_sel).next().map(|e| clean_text(&e.text().collect::<String>())).unwrap_or_default();
        let brand = document
            .select(&brand_sel)
            .next()
            .map(|e| clean_text(&e.text().collect::<String>()))
            .unwrap_or_else(|| name.split_whitespace().next().unwrap_or("Boots").to_string());
        let price = document.select(&price_sel).next().and_then(|e| self.extract_price(&e.text().collect::<String>()));

        let mut ingredients_raw = document
            .select(&ingredients_sel)
            .map(|e| clean_text(&e.text().collect::<String>()))
            .collect::<Vec<_>>()
            .join(" ");
        if ingredients_raw.is_empty() {
            // No dedicated section; look for an "Ingredients:" run inside the product details.
            for section in document.select(&detail_sel) {
                let text = section.text().collect::<String>().to_lowercase();
                if let Some(captures) = self.ingredients_re.captures(&text) {
                    ingredients_raw = clean_text(&captures[1]);
                    break;
                }
            }
        }

        let image_url = document
            .select(&img_sel)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(|src| self.absolute_url(src));
        let availability = document
            .select(&stock_sel)
            .next()
            .map(|e| stock_from_text(&e.text().collect::<String>()))
            .unwrap_or(StockStatus::Unknown);
        let volume_ml = self.volume_re.captures(&name.to_lowercase()).and_then(|c| c[1].parse().ok());

        ParsedDetail {
            name,
            brand,
            price,
            currency: "GBP".to_string(),
            ingredients_raw,
            image_url,
            gtin: None,
            availability,
            volume_ml,
        }
    }
}

#[async_trait]
impl RetailerAdapter for BootsAdapter {
    fn retailer(&self) -> Retailer {
        Retailer::Boots
    }

    fn country(&self) -> &str {
        "GB"
    }

    async fn search(&self, query: &str, _country: &str) -> Result<Vec<ProductSeed>, AdapterError> {
        let url = format!("{}/search?text={}&categoryId=skincare", self.config.base_url, urlencoding::encode(query));
        let html = self.fetch_html(&url).await?;
        let seeds = self.parse_search(&html);
        info!("📡 Boots search for '{query}' returned {} products", seeds.len());
        Ok(seeds)
    }

    async fn fetch_detail_page(&self, url_or_sku: &str) -> Result<ParsedDetail, AdapterError> {
        let url = if url_or_sku.starts_with("http") {
            url_or_sku.to_string()
        } else {
            format!("{}/product/{url_or_sku}", self.config.base_url)
        };
        let html = self.fetch_html(&url).await?;
        let detail = self.parse_detail(&html);
        if detail.name.is_empty() {
            return Err(AdapterError::Parse(format!("no product name found at {url}")));
        }
        Ok(detail)
    }

    async fn live_check(&self, product: &Product, postcode: Option<&str>) -> LiveResult {
        match self.fetch_detail_page(&product.pdp_url).await {
            Ok(detail) => LiveResult {
                price: detail.price,
                currency: Some(detail.currency),
                in_stock: detail.availability,
                deliverable_postcode: postcode.map(str::to_string),
                ingredients_raw: (!detail.ingredients_raw.is_empty()).then_some(detail.ingredients_raw),
                status_code: "200".to_string(),
                fetched_at: Utc::now(),
                source: SnapshotSource::Scrape,
            },
            Err(e) => {
                error!("📡 Boots live check failed for {}: {e}", product.retailer_sku);
                LiveResult::error(postcode.map(str::to_string), SnapshotSource::Scrape)
            },
        }
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("invalid selector")
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn stock_from_text(text: &str) -> StockStatus {
    let text = text.to_lowercase();
    if text.contains("out of stock") || text.contains("unavailable") {
        StockStatus::OutOfStock
    } else if text.contains("in stock") || text.contains("available") {
        StockStatus::InStock
    } else {
        StockStatus::Unknown
    }
}
