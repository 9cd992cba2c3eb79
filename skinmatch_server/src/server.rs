use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use retail_adapters::{BootsAdapter, RainforestAdapter};
use skinmatch_engine::{
    ingredients::{AliasTable, IngredientNormalizer},
    verification::{AdapterRegistry, LiveVerifier, MemoryCache},
    MatchFlowApi,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{health, match_products, products_health},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let api = build_match_api(&config, db);
    // One engine instance for the whole server; workers share it by reference.
    let api_data = web::Data::new(api);
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("smg::access_log"))
            .app_data(api_data.clone())
            .service(health)
            .service(
                web::scope("/api")
                    .route("/products/match", web::post().to(match_products::<SqliteDatabase>))
                    .route("/products/health", web::get().to(products_health::<SqliteDatabase>)),
            )
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Wires the engine: normalizer, cache, adapter registry and verifier, all constructed once and
/// owned by the returned API.
fn build_match_api(config: &ServerConfig, db: SqliteDatabase) -> MatchFlowApi<SqliteDatabase> {
    let normalizer = Arc::new(IngredientNormalizer::with_threshold(AliasTable::load(), config.fuzzy_match_threshold));
    let mut registry = AdapterRegistry::new();
    match RainforestAdapter::new(config.rainforest.clone()) {
        Ok(adapter) => registry.register(Arc::new(adapter)),
        Err(e) => warn!("📡 Amazon adapter not registered: {e}"),
    }
    match BootsAdapter::new(config.boots.clone()) {
        Ok(adapter) => registry.register(Arc::new(adapter)),
        Err(e) => warn!("📡 Boots adapter not registered: {e}"),
    }
    info!("📡 {} retailer adapter(s) registered", registry.len());
    let cache = Arc::new(MemoryCache::new());
    let verifier = LiveVerifier::new(db.clone(), cache, Arc::new(registry), config.verify_options());
    MatchFlowApi::new(db, normalizer, verifier, config.match_options())
}
