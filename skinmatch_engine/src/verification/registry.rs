use std::{collections::HashMap, sync::Arc};

use log::debug;

use crate::{db_types::Retailer, traits::RetailerAdapter};

/// The set of retailer adapters this deployment can call, keyed by [`Retailer`].
///
/// Built once at startup and handed to the orchestrator by reference-counted clone; there is no
/// global registry and no string-keyed lookup, so a typo'd retailer name cannot silently
/// register. A candidate whose retailer has no entry is simply unverifiable in this pass.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<Retailer, Arc<dyn RetailerAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter under its own retailer identity. Re-registering a retailer replaces
    /// the previous adapter.
    pub fn register(&mut self, adapter: Arc<dyn RetailerAdapter>) {
        let retailer = adapter.retailer();
        debug!("📡 Registered adapter for {retailer} ({})", adapter.country());
        self.adapters.insert(retailer, adapter);
    }

    pub fn get(&self, retailer: &Retailer) -> Option<Arc<dyn RetailerAdapter>> {
        self.adapters.get(retailer).cloned()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// The registered adapters, for diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = (&Retailer, &Arc<dyn RetailerAdapter>)> {
        self.adapters.iter()
    }
}
