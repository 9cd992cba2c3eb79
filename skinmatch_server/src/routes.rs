//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two MUST go into
//! a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the product store so endpoint tests can run them against in-memory
//! doubles; the server registers them with the concrete SQLite backend.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use skinmatch_engine::{db_types::MatchRequest, traits::ProductStore, MatchFlowApi};

use crate::{
    data_objects::{AdapterStatus, HealthConfiguration, MatchResponseBody, ProductsHealthReport},
    errors::ServerError,
};

// ----------------------------------------------   Health  ----------------------------------------------------

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ------------------------------------------   Product match  -------------------------------------------------

/// `POST /api/products/match`
///
/// Validation failures surface as 400 with a `detail` body; zero verifiable candidates is a
/// successful 200 with an empty result list.
pub async fn match_products<B: ProductStore + 'static>(
    api: web::Data<MatchFlowApi<B>>,
    body: web::Json<MatchRequest>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    info!(
        "💻️ Match request - country: {}, required: {:?}, avoid: {:?}, max price: {:?}",
        request.country, request.required_ingredients, request.avoid_ingredients, request.max_price
    );
    let outcome = api.match_products(request).await?;
    let response = MatchResponseBody::from(outcome);
    info!("💻️ Match request complete - {} result(s)", response.results.len());
    Ok(HttpResponse::Ok().json(response))
}

// ------------------------------------------   Service health  ------------------------------------------------

/// `GET /api/products/health`
///
/// Reports the registered adapters and the effective matching configuration.
pub async fn products_health<B: ProductStore + 'static>(api: web::Data<MatchFlowApi<B>>) -> HttpResponse {
    trace!("💻️ Received product service health request");
    let adapters = api
        .verifier()
        .adapters()
        .iter()
        .map(|(retailer, adapter)| AdapterStatus {
            retailer: retailer.to_string(),
            country: adapter.country().to_string(),
            status: "available".to_string(),
        })
        .collect();
    let report = ProductsHealthReport {
        service: "products".to_string(),
        status: "healthy".to_string(),
        adapters,
        configuration: HealthConfiguration {
            top_n_live_check: api.verifier().options().top_n,
            live_check_timeout_secs: api.verifier().options().live_check_timeout.as_secs(),
            supported_countries: api.options().country_whitelist.clone(),
        },
    };
    HttpResponse::Ok().json(report)
}
