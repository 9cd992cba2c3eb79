use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use log::trace;
use tokio::{sync::RwLock, time::Instant};

use crate::traits::{CacheKey, LiveResult, VerificationCache};

/// In-process TTL cache for live-verification results.
///
/// Entries carry their expiry instant and are dropped lazily: reads skip expired entries, and
/// each write sweeps any entries that have lapsed. Writers race with last-writer-wins semantics,
/// which is safe because concurrent writers for the same key compute equivalent data within the
/// same verification window.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<CacheKey, (Instant, LiveResult)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.read().await.values().filter(|(expires, _)| *expires > now).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl VerificationCache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Option<LiveResult> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some((expires, result)) if *expires > Instant::now() => {
                trace!("📦 Cache hit for {key}");
                Some(result.clone())
            },
            _ => None,
        }
    }

    async fn put(&self, key: CacheKey, value: LiveResult, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (expires, _)| *expires > now);
        entries.insert(key, (now + ttl, value));
    }
}
