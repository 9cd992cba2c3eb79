use std::{sync::Arc, time::Duration};

use chrono::Utc;
use log::*;
use thiserror::Error;
use tokio::{
    task::JoinSet,
    time::{timeout_at, Instant},
};

use crate::{
    db_types::{NewLiveSnapshot, Product, Retailer, ScoredCandidate, SnapshotSource, StockStatus},
    traits::{CacheKey, LiveResult, ProductStore, VerificationCache},
    verification::AdapterRegistry,
};

/// Tunables for one verification pass.
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    /// Only the top-N scored candidates enter the pipeline; the rest are discarded after scoring.
    pub top_n: usize,
    /// Per-adapter live-check budget. Adapters enforce this as their own request timeout.
    pub live_check_timeout: Duration,
    /// Added to `live_check_timeout` to form the global soft deadline for the whole fan-out.
    pub deadline_buffer: Duration,
    /// How long a verification result stays usable in the cache.
    pub cache_ttl: Duration,
    /// A product verified within this window is re-used from its stored row without network work.
    pub recent_verification_window: chrono::Duration,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            top_n: 20,
            live_check_timeout: Duration::from_secs(8),
            deadline_buffer: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(15 * 60),
            recent_verification_window: chrono::Duration::hours(24),
        }
    }
}

/// A candidate that survived live verification, ready for response assembly.
#[derive(Debug, Clone)]
pub struct VerifiedCandidate {
    pub product: Product,
    pub score: f64,
    pub live: LiveResult,
}

/// Why one candidate fell out of a verification pass. These never propagate to the caller; they
/// are logged and the candidate is dropped.
#[derive(Debug, Clone, Error)]
enum VerifyError {
    #[error("No adapter registered for retailer {0}")]
    UnavailableAdapter(Retailer),
    #[error("Live check for {sku} failed with status {status}")]
    LiveCheckFailed { sku: String, status: String },
}

/// The live-verification orchestrator.
///
/// Owns its collaborators (store handle, result cache, adapter registry) explicitly; nothing in
/// here reaches for process-wide state, so tests can hand in in-memory doubles.
pub struct LiveVerifier<B> {
    db: B,
    cache: Arc<dyn VerificationCache>,
    adapters: Arc<AdapterRegistry>,
    options: VerifyOptions,
}

impl<B: Clone> Clone for LiveVerifier<B> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            cache: Arc::clone(&self.cache),
            adapters: Arc::clone(&self.adapters),
            options: self.options.clone(),
        }
    }
}

impl<B> LiveVerifier<B>
where B: ProductStore + 'static
{
    pub fn new(db: B, cache: Arc<dyn VerificationCache>, adapters: Arc<AdapterRegistry>, options: VerifyOptions) -> Self {
        Self { db, cache, adapters, options }
    }

    pub fn options(&self) -> &VerifyOptions {
        &self.options
    }

    pub fn adapters(&self) -> &AdapterRegistry {
        &self.adapters
    }

    /// Verifies the top-N scored candidates concurrently and returns those that could be
    /// verified, in their incoming (score) order, so the caller's re-sort keeps that order for
    /// equal scores.
    ///
    /// All attempts are issued at once and drained under one soft deadline. On expiry, whatever
    /// has completed is returned and the in-flight remainder is abandoned; a slow retailer never
    /// fails the whole request. Individual failures are isolated per task.
    pub async fn verify_top_candidates(
        &self,
        scored: Vec<ScoredCandidate>,
        postcode: Option<&str>,
    ) -> Vec<VerifiedCandidate> {
        let total = scored.len().min(self.options.top_n);
        let deadline = Instant::now() + self.options.live_check_timeout + self.options.deadline_buffer;
        let mut tasks = JoinSet::new();
        for (index, candidate) in scored.into_iter().take(self.options.top_n).enumerate() {
            let db = self.db.clone();
            let cache = Arc::clone(&self.cache);
            let adapters = Arc::clone(&self.adapters);
            let options = self.options.clone();
            let postcode = postcode.map(str::to_string);
            tasks.spawn(async move {
                (index, verify_candidate(db, cache, adapters, options, candidate, postcode).await)
            });
        }

        let mut verified = Vec::with_capacity(total);
        loop {
            match timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((index, Ok(candidate))))) => verified.push((index, candidate)),
                Ok(Some(Ok((_, Err(e))))) => debug!("🔄️ Candidate dropped from verification pass. {e}"),
                Ok(Some(Err(e))) => error!("🔄️ Verification task did not complete: {e}"),
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        "🔄️ Live verification deadline expired after {:?}. Keeping {} completed result(s).",
                        self.options.live_check_timeout + self.options.deadline_buffer,
                        verified.len()
                    );
                    tasks.abort_all();
                    break;
                },
            }
        }
        info!("✅ Live verification completed: {}/{total} candidates verified", verified.len());
        // Completion order is arbitrary; hand results back in submission order.
        verified.sort_by_key(|(index, _)| *index);
        verified.into_iter().map(|(_, candidate)| candidate).collect()
    }
}

/// The per-candidate state machine: cache hit → recent-verification short-circuit → live fetch
/// with transactional persist.
async fn verify_candidate<B: ProductStore>(
    db: B,
    cache: Arc<dyn VerificationCache>,
    adapters: Arc<AdapterRegistry>,
    options: VerifyOptions,
    candidate: ScoredCandidate,
    postcode: Option<String>,
) -> Result<VerifiedCandidate, VerifyError> {
    let ScoredCandidate { mut product, score } = candidate;
    let key = CacheKey::new(product.retailer.clone(), product.retailer_sku.clone(), postcode.as_deref());

    if let Some(live) = cache.get(&key).await {
        debug!("🔄️ Using cached live result for {}", product.retailer_sku);
        return Ok(VerifiedCandidate { product, score, live });
    }

    let now = Utc::now();
    if product.verified_within(options.recent_verification_window, now) {
        debug!("🔄️ Using recent verification for {}", product.retailer_sku);
        let live = LiveResult {
            price: product.price,
            currency: Some(product.currency.clone()),
            in_stock: StockStatus::Unknown,
            deliverable_postcode: postcode.clone(),
            ingredients_raw: Some(product.ingredients_raw.clone()),
            status_code: "recent".to_string(),
            fetched_at: product.last_live_verified.unwrap_or(now),
            source: SnapshotSource::Database,
        };
        cache.put(key, live.clone(), options.cache_ttl).await;
        return Ok(VerifiedCandidate { product, score, live });
    }

    let adapter = adapters
        .get(&product.retailer)
        .ok_or_else(|| VerifyError::UnavailableAdapter(product.retailer.clone()))?;
    let live = adapter.live_check(&product, postcode.as_deref()).await;
    if live.is_error() {
        return Err(VerifyError::LiveCheckFailed {
            sku: product.retailer_sku.clone(),
            status: live.status_code,
        });
    }

    let snapshot = NewLiveSnapshot {
        product_id: product.id,
        fetched_at: live.fetched_at,
        price: live.price,
        currency: live.currency.clone(),
        in_stock: live.in_stock,
        deliverable_postcode: live.deliverable_postcode.clone(),
        ingredients_raw: live.ingredients_raw.clone(),
        status_code: Some(live.status_code.clone()),
        source: live.source,
    };
    if let Err(e) = db.record_verification(product.id, live.price, live.fetched_at, snapshot).await {
        // The write was rolled back; the verified value is still good for this response.
        error!("🗃️ Could not persist verification for {}: {e}", product.retailer_sku);
    }
    cache.put(key, live.clone(), options.cache_ttl).await;

    if let Some(price) = live.price {
        product.price = Some(price);
    }
    product.last_live_verified = Some(live.fetched_at);
    Ok(VerifiedCandidate { product, score, live })
}

#[cfg(test)]
mod test {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::test_utils::stubs::{InMemoryStore, StubAdapter};

    fn scored(product: Product, score: f64) -> ScoredCandidate {
        ScoredCandidate { product, score }
    }

    fn verifier_with(adapters: AdapterRegistry) -> LiveVerifier<InMemoryStore> {
        LiveVerifier::new(
            InMemoryStore::new(),
            Arc::new(crate::verification::MemoryCache::new()),
            Arc::new(adapters),
            VerifyOptions::default(),
        )
    }

    #[tokio::test]
    async fn cached_result_short_circuits_the_adapter() {
        let adapter = StubAdapter::in_stock(Retailer::Boots, 9.99);
        let calls = adapter.calls();
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(adapter));
        let verifier = verifier_with(registry);

        let product = crate::test_utils::fixtures::product_with_ingredients("boots", "sku-1", &["niacinamide"]);
        let first = verifier.verify_top_candidates(vec![scored(product.clone(), 50.0)], None).await;
        assert_eq!(first.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let second = verifier.verify_top_candidates(vec![scored(product, 50.0)], None).await;
        assert_eq!(second.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1, "adapter was re-invoked despite a cached result");
    }

    #[tokio::test]
    async fn recent_verification_skips_network_and_caches() {
        let adapter = StubAdapter::in_stock(Retailer::Boots, 9.99);
        let calls = adapter.calls();
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(adapter));
        let verifier = verifier_with(registry);

        let product = crate::test_utils::fixtures::ProductFixture::new("boots", "sku-1")
            .ingredients(&["niacinamide"])
            .price(12.5)
            .verified_at(Utc::now() - chrono::Duration::hours(1))
            .build();
        let verified = verifier.verify_top_candidates(vec![scored(product, 40.0)], None).await;
        assert_eq!(verified.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(verified[0].live.status_code, "recent");
        assert_eq!(verified[0].live.source, SnapshotSource::Database);
        assert_eq!(verified[0].live.price, Some(12.5));
    }

    #[tokio::test]
    async fn missing_adapter_drops_the_candidate() {
        let verifier = verifier_with(AdapterRegistry::new());
        let product = crate::test_utils::fixtures::product_with_ingredients("boots", "sku-1", &["niacinamide"]);
        let verified = verifier.verify_top_candidates(vec![scored(product, 40.0)], None).await;
        assert!(verified.is_empty());
    }

    #[tokio::test]
    async fn error_result_drops_only_that_candidate() {
        let good = StubAdapter::in_stock(Retailer::Boots, 9.99);
        let bad = StubAdapter::erroring(Retailer::Amazon);
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(good));
        registry.register(Arc::new(bad));
        let verifier = verifier_with(registry);

        let boots = crate::test_utils::fixtures::product_with_ingredients("boots", "b-1", &["niacinamide"]);
        let amazon = crate::test_utils::fixtures::product_with_ingredients("amazon", "a-1", &["niacinamide"]);
        let verified = verifier
            .verify_top_candidates(vec![scored(boots, 60.0), scored(amazon, 55.0)], None)
            .await;
        assert_eq!(verified.len(), 1);
        assert_eq!(verified[0].product.retailer, Retailer::Boots);
    }

    #[tokio::test]
    async fn successful_check_persists_price_and_snapshot() {
        let adapter = StubAdapter::in_stock(Retailer::Boots, 7.49);
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(adapter));
        let store = InMemoryStore::new();
        let verifier = LiveVerifier::new(
            store.clone(),
            Arc::new(crate::verification::MemoryCache::new()),
            Arc::new(registry),
            VerifyOptions::default(),
        );

        let product = crate::test_utils::fixtures::product_with_ingredients("boots", "sku-1", &["niacinamide"]);
        let verified = verifier.verify_top_candidates(vec![scored(product, 60.0)], Some("SW1A 1AA")).await;
        assert_eq!(verified.len(), 1);
        assert_eq!(verified[0].product.price, Some(7.49));
        let recorded = store.recorded_verifications().await;
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].1, Some(7.49));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expiry_keeps_completed_results() {
        let fast = StubAdapter::in_stock(Retailer::Boots, 9.99);
        let slow = StubAdapter::in_stock(Retailer::Amazon, 5.49).with_delay(Duration::from_secs(60));
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(fast));
        registry.register(Arc::new(slow));
        let options = VerifyOptions {
            live_check_timeout: Duration::from_millis(100),
            deadline_buffer: Duration::from_millis(50),
            ..Default::default()
        };
        let verifier = LiveVerifier::new(
            InMemoryStore::new(),
            Arc::new(crate::verification::MemoryCache::new()),
            Arc::new(registry),
            options,
        );

        let boots = crate::test_utils::fixtures::product_with_ingredients("boots", "b-1", &["niacinamide"]);
        let amazon = crate::test_utils::fixtures::product_with_ingredients("amazon", "a-1", &["niacinamide"]);
        let verified = verifier
            .verify_top_candidates(vec![scored(amazon, 70.0), scored(boots, 60.0)], None)
            .await;
        assert_eq!(verified.len(), 1, "the slow candidate should have been abandoned");
        assert_eq!(verified[0].product.retailer, Retailer::Boots);
    }

    #[tokio::test]
    async fn top_n_bounds_the_fan_out() {
        let adapter = StubAdapter::in_stock(Retailer::Boots, 9.99);
        let calls = adapter.calls();
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(adapter));
        let store = InMemoryStore::new();
        let options = VerifyOptions { top_n: 3, ..Default::default() };
        let verifier = LiveVerifier::new(
            store,
            Arc::new(crate::verification::MemoryCache::new()),
            Arc::new(registry),
            options,
        );

        let candidates: Vec<ScoredCandidate> = (0..10)
            .map(|i| {
                let p = crate::test_utils::fixtures::product_with_ingredients("boots", format!("sku-{i}"), &["niacinamide"]);
                scored(p, 50.0 - i as f64)
            })
            .collect();
        let verified = verifier.verify_top_candidates(candidates, None).await;
        assert_eq!(verified.len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
