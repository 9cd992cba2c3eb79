use std::{fmt::Debug, sync::Arc};

use chrono::Utc;
use log::*;

use crate::{
    db_types::{MatchRequest, ScoredCandidate},
    ingredients::IngredientNormalizer,
    match_api::{MatchOutcome, MatchingError},
    matching::{filter, scorer},
    traits::ProductStore,
    verification::LiveVerifier,
};

/// Engine-level request policy.
#[derive(Debug, Clone)]
pub struct MatchOptions {
    /// Countries the deployment serves. Requests outside this list are rejected up front.
    pub country_whitelist: Vec<String>,
    /// Upper bound on candidates entering scoring.
    pub candidate_cap: usize,
    /// Currency reported when the request does not ask for one.
    pub default_currency: String,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            country_whitelist: vec!["GB".to_string()],
            candidate_cap: filter::CANDIDATE_CAP,
            default_currency: "GBP".to_string(),
        }
    }
}

/// `MatchFlowApi` is the primary API for answering match requests: validate → normalize →
/// filter → score → live-verify → re-sort.
pub struct MatchFlowApi<B> {
    db: B,
    normalizer: Arc<IngredientNormalizer>,
    verifier: LiveVerifier<B>,
    options: MatchOptions,
}

impl<B> Debug for MatchFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MatchFlowApi")
    }
}

impl<B: Clone> Clone for MatchFlowApi<B> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            normalizer: Arc::clone(&self.normalizer),
            verifier: self.verifier.clone(),
            options: self.options.clone(),
        }
    }
}

impl<B> MatchFlowApi<B>
where B: ProductStore + 'static
{
    pub fn new(db: B, normalizer: Arc<IngredientNormalizer>, verifier: LiveVerifier<B>, options: MatchOptions) -> Self {
        Self { db, normalizer, verifier, options }
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    pub fn verifier(&self) -> &LiveVerifier<B> {
        &self.verifier
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Answers one match request.
    ///
    /// Validation failures are immediate and local; nothing is filtered before the request is
    /// known to be well-formed. Zero candidates (or zero *verifiable* candidates) is a valid,
    /// successful outcome with an empty result list.
    pub async fn match_products(&self, request: MatchRequest) -> Result<MatchOutcome, MatchingError> {
        self.validate(&request)?;
        let currency = request.currency.clone().unwrap_or_else(|| self.options.default_currency.clone());

        let required = self.normalizer.normalize_list(&request.required_ingredients);
        let avoided = self.normalizer.normalize_list(&request.avoid_ingredients);
        info!("🧪 Normalized ingredients - required: {required:?}, avoid: {avoided:?}");
        if required.is_empty() {
            // Every required term normalized away to nothing.
            return Err(MatchingError::InvalidRequest(
                "At least one required ingredient must be specified".to_string(),
            ));
        }

        let rows = self.db.fetch_candidates(&request.country, request.max_price).await?;
        let mut candidates = Vec::new();
        for product in rows {
            let terms = filter::product_search_terms(&product, &self.normalizer);
            if filter::matches_required(&terms, &required, &self.normalizer)
                && filter::matches_avoided(&terms, &avoided, &self.normalizer)
            {
                candidates.push(product);
                if candidates.len() >= self.options.candidate_cap {
                    break;
                }
            }
        }
        info!("📊 Found {} candidate products for {}", candidates.len(), request.country);
        if candidates.is_empty() {
            return Ok(MatchOutcome::empty(currency));
        }

        let now = Utc::now();
        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|product| {
                let score = scorer::score(&product, &required, &self.normalizer, now);
                ScoredCandidate { product, score }
            })
            .collect();
        // Stable: candidates with equal scores keep their filter (last_seen) order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        debug!("🎯 Scored {} matching products", scored.len());

        let mut results = self.verifier.verify_top_candidates(scored, request.postcode()).await;
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        info!("✅ Match complete: {} verified product(s) returned", results.len());

        Ok(MatchOutcome { generated_at: Utc::now(), currency, results })
    }

    fn validate(&self, request: &MatchRequest) -> Result<(), MatchingError> {
        if !self.options.country_whitelist.iter().any(|c| c == &request.country) {
            return Err(MatchingError::InvalidRequest(format!(
                "Country '{}' is not supported. Supported countries: {}",
                request.country,
                self.options.country_whitelist.join(", ")
            )));
        }
        if request.required_ingredients.is_empty() {
            return Err(MatchingError::InvalidRequest(
                "At least one required ingredient must be specified".to_string(),
            ));
        }
        if let Some(max_price) = request.max_price {
            if max_price <= 0.0 {
                return Err(MatchingError::InvalidRequest("Maximum price must be greater than 0".to_string()));
            }
        }
        debug!(
            "✅ Match request validated - country: {}, required: {}, avoid: {}",
            request.country,
            request.required_ingredients.len(),
            request.avoid_ingredients.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        db_types::Retailer,
        test_utils::{
            fixtures::ProductFixture,
            stubs::{InMemoryStore, StubAdapter},
        },
        verification::{AdapterRegistry, MemoryCache, VerifyOptions},
    };

    fn api_with(store: InMemoryStore, registry: AdapterRegistry) -> MatchFlowApi<InMemoryStore> {
        let verifier = LiveVerifier::new(
            store.clone(),
            Arc::new(MemoryCache::new()),
            Arc::new(registry),
            VerifyOptions::default(),
        );
        MatchFlowApi::new(store, Arc::new(IngredientNormalizer::default()), verifier, MatchOptions::default())
    }

    fn request(country: &str, required: &[&str]) -> MatchRequest {
        MatchRequest {
            country: country.to_string(),
            location: None,
            required_ingredients: required.iter().map(|s| s.to_string()).collect(),
            avoid_ingredients: Vec::new(),
            max_price: None,
            currency: None,
        }
    }

    #[tokio::test]
    async fn unsupported_country_is_rejected() {
        let api = api_with(InMemoryStore::new(), AdapterRegistry::new());
        let err = api.match_products(request("FR", &["niacinamide"])).await.unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn empty_required_list_is_rejected() {
        let api = api_with(InMemoryStore::new(), AdapterRegistry::new());
        let err = api.match_products(request("GB", &[])).await.unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn non_positive_max_price_is_rejected() {
        let api = api_with(InMemoryStore::new(), AdapterRegistry::new());
        let mut req = request("GB", &["niacinamide"]);
        req.max_price = Some(0.0);
        let err = api.match_products(req).await.unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn no_candidates_is_a_successful_empty_outcome() {
        let api = api_with(InMemoryStore::new(), AdapterRegistry::new());
        let outcome = api.match_products(request("GB", &["niacinamide"])).await.unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.currency, "GBP");
    }

    #[tokio::test]
    async fn results_are_sorted_by_descending_score() {
        let store = InMemoryStore::new();
        // Deeper ingredient position → lower score for the second product.
        store
            .seed(ProductFixture::new("boots", "front").ingredients(&["niacinamide", "aqua"]).build_new())
            .await;
        store
            .seed(
                ProductFixture::new("boots", "back")
                    .ingredients(&["aqua", "glycerin", "dimethicone", "niacinamide"])
                    .build_new(),
            )
            .await;
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(StubAdapter::in_stock(Retailer::Boots, 9.99)));
        let api = api_with(store, registry);

        let outcome = api.match_products(request("GB", &["niacinamide"])).await.unwrap();
        assert_eq!(outcome.results.len(), 2);
        assert!(outcome.results[0].score >= outcome.results[1].score);
        assert_eq!(outcome.results[0].product.retailer_sku, "front");
    }

    #[tokio::test]
    async fn requested_currency_is_echoed() {
        let api = api_with(InMemoryStore::new(), AdapterRegistry::new());
        let mut req = request("GB", &["niacinamide"]);
        req.currency = Some("EUR".to_string());
        let outcome = api.match_products(req).await.unwrap();
        assert_eq!(outcome.currency, "EUR");
    }
}
