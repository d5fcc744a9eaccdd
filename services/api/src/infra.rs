use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use worknear::config::SearchConfig;
use worknear::marketplace::{Marketplace, MemoryStore, SearchPolicy};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Marketplace services over a fresh in-memory store.
pub(crate) fn in_memory_marketplace(search: SearchConfig) -> Arc<Marketplace<MemoryStore>> {
    let store = Arc::new(MemoryStore::new());
    Arc::new(Marketplace::new(store, SearchPolicy::new(search)))
}
