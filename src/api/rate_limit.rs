// =============================================================================
// Rate Limiter — per-client request budget
// =============================================================================
//
// A keyed `governor` limiter (GCRA). Each client, keyed by remote IP or a
// shared bucket when the address is not known, may burst `max_requests`
// and then regains one request every `window / max_requests`.
// =============================================================================

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{
    clock::{Clock, DefaultClock},
    middleware::NoOpMiddleware,
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter as GovernorRateLimiter,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::runtime_config::RateLimitConfig;

/// Clients tracked before idle ones are reclaimed.
const MAX_TRACKED_CLIENTS: usize = 1024;

type KeyedLimiter<C> = GovernorRateLimiter<
    String,
    DefaultKeyedStateStore<String>,
    C,
    NoOpMiddleware<<C as Clock>::Instant>,
>;

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Limited { retry_after: Duration },
}

/// Immutable snapshot of the limiter (suitable for a status payload).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitSnapshot {
    pub max_requests: u32,
    pub window_ms: u64,
    pub tracked_clients: usize,
}

pub struct RateLimiter<C: Clock = DefaultClock> {
    max_requests: u32,
    window: Duration,
    clock: C,
    limiter: KeyedLimiter<C>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self::with_clock(max_requests, window, DefaultClock::default())
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_millis(config.window_ms))
    }
}

impl<C: Clock> RateLimiter<C> {
    pub fn with_clock(max_requests: u32, window: Duration, clock: C) -> Self {
        let burst = NonZeroU32::new(max_requests).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(window / burst.get())
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            max_requests: burst.get(),
            window,
            limiter: GovernorRateLimiter::dashmap_with_clock(quota, &clock),
            clock,
        }
    }

    /// Count one request from `client` and decide whether it is admitted.
    pub fn check(&self, client: &str) -> Admission {
        if self.limiter.len() > MAX_TRACKED_CLIENTS {
            self.limiter.retain_recent();
            self.limiter.shrink_to_fit();
        }

        match self.limiter.check_key(&client.to_string()) {
            Ok(()) => {
                debug!(client, "request admitted");
                Admission::Allowed
            }
            Err(not_until) => {
                let retry_after = not_until.wait_time_from(self.clock.now());
                warn!(
                    client,
                    limit = self.max_requests,
                    retry_after_ms = retry_after.as_millis() as u64,
                    "request blocked by rate limiter"
                );
                Admission::Limited { retry_after }
            }
        }
    }

    pub fn snapshot(&self) -> RateLimitSnapshot {
        RateLimitSnapshot {
            max_requests: self.max_requests,
            window_ms: self.window.as_millis() as u64,
            tracked_clients: self.limiter.len(),
        }
    }
}

impl<C: Clock> std::fmt::Debug for RateLimiter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max_requests", &self.max_requests)
            .field("window", &self.window)
            .field("tracked_clients", &self.limiter.len())
            .finish()
    }
}
