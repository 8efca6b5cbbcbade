// =============================================================================
// Central Application State
// =============================================================================
//
// Shared across every request handler via `Arc<AppState>`. The engine owns
// the upstream source and the view cache; the limiter is present only when
// rate limiting is enabled.
// =============================================================================

use std::sync::Arc;
use std::time::Instant;

use crate::analytics::{AnalyticsEngine, CachedView};
use crate::api::rate_limit::RateLimiter;
use crate::cache::TtlCache;
use crate::injective::MarketDataSource;
use crate::runtime_config::ServiceConfig;

pub struct AppState {
    pub config: ServiceConfig,
    pub engine: AnalyticsEngine,
    pub rate_limiter: Option<RateLimiter>,
    pub started_at: Instant,
}

impl AppState {
    /// Wire the engine and limiter from `config` around an existing source.
    pub fn new(config: ServiceConfig, source: Arc<dyn MarketDataSource>) -> Self {
        let cache = Arc::new(
            TtlCache::<CachedView>::new(config.cache.ttl(), config.cache.enabled)
                .with_max_entries(config.cache.max_entries),
        );
        let rate_limiter = config
            .rate_limit
            .enabled
            .then(|| RateLimiter::from_config(&config.rate_limit));

        Self {
            engine: AnalyticsEngine::new(source, cache),
            rate_limiter,
            started_at: Instant::now(),
            config,
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("bind_addr", &self.config.bind_addr)
            .field("engine", &self.engine)
            .field("rate_limiter", &self.rate_limiter)
            .finish()
    }
}
