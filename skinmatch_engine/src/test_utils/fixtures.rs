use chrono::{DateTime, Utc};

use crate::db_types::{NewProduct, Product, Retailer};

/// Builder for catalog-entry fixtures.
#[derive(Debug, Clone)]
pub struct ProductFixture {
    id: i64,
    retailer: String,
    sku: String,
    country: String,
    ingredients: Vec<String>,
    price: Option<f64>,
    price_per_ml: Option<f64>,
    last_seen: DateTime<Utc>,
    verified_at: Option<DateTime<Utc>>,
}

impl ProductFixture {
    pub fn new(retailer: &str, sku: impl Into<String>) -> Self {
        Self {
            id: 1,
            retailer: retailer.to_string(),
            sku: sku.into(),
            country: "GB".to_string(),
            ingredients: Vec::new(),
            price: None,
            price_per_ml: None,
            last_seen: Utc::now(),
            verified_at: None,
        }
    }

    pub fn id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn country(mut self, country: &str) -> Self {
        self.country = country.to_string();
        self
    }

    pub fn ingredients(mut self, ingredients: &[&str]) -> Self {
        self.ingredients = ingredients.iter().map(|i| i.to_string()).collect();
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn price_per_ml(mut self, ppu: f64) -> Self {
        self.price_per_ml = Some(ppu);
        self
    }

    pub fn last_seen(mut self, at: DateTime<Utc>) -> Self {
        self.last_seen = at;
        self
    }

    pub fn verified_at(mut self, at: DateTime<Utc>) -> Self {
        self.verified_at = Some(at);
        self
    }

    pub fn build_new(&self) -> NewProduct {
        let retailer = Retailer::from(self.retailer.clone());
        let mut new = NewProduct::new(retailer, self.sku.clone(), format!("Test Serum {}", self.sku), self.country.clone());
        new.brand = "Testbrand".to_string();
        new.pdp_url = format!("https://shop.example/product/{}", self.sku);
        new.price = self.price;
        new.price_per_ml = self.price_per_ml;
        new.ingredients_raw = self.ingredients.join(", ");
        new.ingredients_norm = self.ingredients.clone();
        new.last_seen = self.last_seen;
        new.last_live_verified = self.verified_at;
        new
    }

    pub fn build(&self) -> Product {
        Product::from_new(self.id, self.build_new())
    }
}

/// Shorthand for the common case: a GB product with the given normalized ingredient sequence.
pub fn product_with_ingredients(retailer: &str, sku: impl Into<String>, ingredients: &[&str]) -> Product {
    ProductFixture::new(retailer, sku).ingredients(ingredients).build()
}
