use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    App,
};
use serde_json::{json, Value};
use skinmatch_engine::{
    db_types::Retailer,
    ingredients::IngredientNormalizer,
    test_utils::{
        fixtures::ProductFixture,
        stubs::{InMemoryStore, StubAdapter},
    },
    verification::{AdapterRegistry, LiveVerifier, MemoryCache, VerifyOptions},
    MatchFlowApi,
    MatchOptions,
};

use crate::routes::{health, match_products, products_health};

fn test_api(store: InMemoryStore, adapters: Vec<Arc<StubAdapter>>) -> MatchFlowApi<InMemoryStore> {
    let mut registry = AdapterRegistry::new();
    for adapter in adapters {
        registry.register(adapter);
    }
    let verifier =
        LiveVerifier::new(store.clone(), Arc::new(MemoryCache::new()), Arc::new(registry), VerifyOptions::default());
    MatchFlowApi::new(store, Arc::new(IngredientNormalizer::default()), verifier, MatchOptions::default())
}

async fn post_match(api: MatchFlowApi<InMemoryStore>, body: Value) -> (StatusCode, Value) {
    let app = App::new().app_data(web::Data::new(api)).service(
        web::scope("/api")
            .route("/products/match", web::post().to(match_products::<InMemoryStore>))
            .route("/products/health", web::get().to(products_health::<InMemoryStore>)),
    );
    let service = test::init_service(app).await;
    let req = TestRequest::post().uri("/api/products/match").set_json(&body).to_request();
    let res = test::call_service(&service, req).await;
    let status = res.status();
    let bytes = res.into_body().try_into_bytes().unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn match_body(required: &[&str]) -> Value {
    json!({ "country": "GB", "required_ingredients": required })
}

#[actix_web::test]
async fn health_endpoint_is_alive() {
    let service = test::init_service(App::new().service(health)).await;
    let res = test::call_service(&service, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn unsupported_country_yields_400_with_detail() {
    let api = test_api(InMemoryStore::new(), vec![]);
    let body = json!({ "country": "ZZ", "required_ingredients": ["niacinamide"] });
    let (status, body) = post_match(api, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("not supported"));
}

#[actix_web::test]
async fn empty_catalog_yields_200_with_no_results() {
    let api = test_api(InMemoryStore::new(), vec![]);
    let (status, body) = post_match(api, match_body(&["niacinamide"])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"].as_array().unwrap().len(), 0);
    assert_eq!(body["currency"], "GBP");
}

#[actix_web::test]
async fn matching_product_is_returned_in_wire_format() {
    let store = InMemoryStore::new();
    store
        .seed(
            ProductFixture::new("boots", "serum-10")
                .ingredients(&["aqua", "glycerin", "niacinamide"])
                .price(12.99)
                .build_new(),
        )
        .await;
    let api = test_api(store, vec![Arc::new(StubAdapter::in_stock(Retailer::Boots, 9.99))]);

    let (status, body) = post_match(api, match_body(&["niacinamide"])).await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result["retailer"], "boots");
    assert_eq!(result["retailer_sku"], "serum-10");
    assert_eq!(result["price"], 9.99);
    assert_eq!(result["formatted_price"], "£9.99");
    assert_eq!(result["availability"], "in_stock");
    assert!(result["ingredients_normalised"].as_array().unwrap().contains(&json!("niacinamide")));
    assert!(result["last_verified"].is_string());
}

#[actix_web::test]
async fn erroring_adapter_drops_its_candidate_from_results() {
    let store = InMemoryStore::new();
    store
        .seed(ProductFixture::new("boots", "b-1").ingredients(&["aqua", "niacinamide"]).build_new())
        .await;
    store
        .seed(ProductFixture::new("amazon", "a-1").ingredients(&["aqua", "niacinamide"]).build_new())
        .await;
    let adapters = vec![
        Arc::new(StubAdapter::in_stock(Retailer::Boots, 9.99)),
        Arc::new(StubAdapter::erroring(Retailer::Amazon)),
    ];
    let api = test_api(store, adapters);

    let (status, body) = post_match(api, match_body(&["niacinamide"])).await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["retailer"], "boots");
}

#[actix_web::test]
async fn products_health_reports_adapters_and_configuration() {
    let api = test_api(InMemoryStore::new(), vec![Arc::new(StubAdapter::in_stock(Retailer::Boots, 9.99))]);
    let app = App::new().app_data(web::Data::new(api)).service(
        web::scope("/api").route("/products/health", web::get().to(products_health::<InMemoryStore>)),
    );
    let service = test::init_service(app).await;
    let res = test::call_service(&service, TestRequest::get().uri("/api/products/health").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = res.into_body().try_into_bytes().unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["service"], "products");
    assert_eq!(body["adapters"][0]["retailer"], "boots");
    assert_eq!(body["configuration"]["top_n_live_check"], 20);
    assert_eq!(body["configuration"]["supported_countries"][0], "GB");
}
