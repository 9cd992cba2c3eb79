//! Shared scaffolding for the end-to-end matching tests: a scratch SQLite database, seeded
//! catalog fixtures, and a fully wired `MatchFlowApi` with stub adapters.
use std::sync::Arc;

use skinmatch_engine::{
    db_types::{MatchRequest, Retailer},
    ingredients::IngredientNormalizer,
    test_utils::{fixtures::ProductFixture, prepare_env::prepare_test_env, stubs::StubAdapter},
    traits::ProductStore,
    verification::{AdapterRegistry, LiveVerifier, MemoryCache, VerifyOptions},
    MatchFlowApi,
    MatchOptions,
    SqliteDatabase,
};

pub async fn scratch_db(url: &str) -> SqliteDatabase {
    prepare_test_env(url).await;
    SqliteDatabase::new_with_url(url, 5).await.expect("Error creating database")
}

/// Wires a `MatchFlowApi` around `db` with the given adapters and default options.
pub fn api_with_adapters(db: SqliteDatabase, adapters: Vec<Arc<StubAdapter>>) -> MatchFlowApi<SqliteDatabase> {
    let mut registry = AdapterRegistry::new();
    for adapter in adapters {
        registry.register(adapter);
    }
    let verifier = LiveVerifier::new(db.clone(), Arc::new(MemoryCache::new()), Arc::new(registry), VerifyOptions::default());
    MatchFlowApi::new(db, Arc::new(IngredientNormalizer::default()), verifier, MatchOptions::default())
}

pub fn boots_adapter() -> Arc<StubAdapter> {
    Arc::new(StubAdapter::in_stock(Retailer::Boots, 9.99))
}

pub fn request(required: &[&str]) -> MatchRequest {
    MatchRequest {
        country: "GB".to_string(),
        location: None,
        required_ingredients: required.iter().map(|s| s.to_string()).collect(),
        avoid_ingredients: Vec::new(),
        max_price: None,
        currency: None,
    }
}

/// Seeds the two-product fixture used by the matching tests: one serum with niacinamide at list
/// index 2, one moisturiser without it.
pub async fn seed_two_product_fixture(db: &SqliteDatabase) {
    let with_niacinamide = ProductFixture::new("boots", "serum-10")
        .ingredients(&["aqua", "glycerin", "niacinamide", "phenoxyethanol"])
        .price(12.99)
        .build_new();
    let without = ProductFixture::new("boots", "moisturiser-11")
        .ingredients(&["aqua", "glycerin", "dimethicone"])
        .price(8.49)
        .build_new();
    db.upsert_product(with_niacinamide).await.expect("Error seeding fixture");
    db.upsert_product(without).await.expect("Error seeding fixture");
}
