//! Rate limiting for public endpoints.
//!
//! Two mechanisms:
//! - Per-IP governor layers protect the unauthenticated surface from floods.
//! - A per-email sliding window throttles password guessing on /auth/login,
//!   independent of source IP.
//!
//! Tiers:
//! - Strict: /auth/signup, /auth/login
//! - Standard: reserved for future public endpoints
//! - Relaxed: /health
//!
//! Configure via environment variables:
//! - RATE_LIMIT_STRICT_RPM (default: 10)
//! - RATE_LIMIT_STANDARD_RPM (default: 30)
//! - RATE_LIMIT_RELAXED_RPM (default: 60)

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;

/// Rate limiter layer type alias using governor types directly
pub type RateLimitLayer = GovernorLayer<
    tower_governor::key_extractor::PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
>;

/// Creates a rate limiter layer with the specified requests per minute.
fn create_layer(requests_per_minute: u32) -> RateLimitLayer {
    assert!(requests_per_minute > 0, "Rate limit must be greater than 0");

    let period_secs = 60 / requests_per_minute as u64;
    let config = GovernorConfigBuilder::default()
        .period(Duration::from_secs(period_secs.max(1)))
        .burst_size(requests_per_minute)
        .finish()
        .expect("Failed to build rate limiter config");

    GovernorLayer {
        config: Arc::new(config),
    }
}

/// Creates a rate limiter layer for the strict tier.
/// Used for the auth endpoints, which do password hashing per request.
pub fn strict_layer(requests_per_minute: u32) -> RateLimitLayer {
    create_layer(requests_per_minute)
}

/// Creates a rate limiter layer for the standard tier.
pub fn standard_layer(requests_per_minute: u32) -> RateLimitLayer {
    create_layer(requests_per_minute)
}

/// Creates a rate limiter layer for the relaxed tier.
/// Used for lightweight endpoints like health checks.
pub fn relaxed_layer(requests_per_minute: u32) -> RateLimitLayer {
    create_layer(requests_per_minute)
}

/// Sliding-window attempt limiter keyed by normalized email.
///
/// The IP-based governor tiers do not stop a distributed guessing campaign
/// against a single account, so login attempts are additionally counted per
/// email. Entries for idle emails are dropped by the periodic `cleanup` call
/// from the background task.
pub struct LoginRateLimiter {
    max_attempts: usize,
    window: Duration,
    attempts: Mutex<HashMap<String, Vec<Instant>>>,
}

impl LoginRateLimiter {
    pub fn new(max_attempts: usize, window_secs: u64) -> Self {
        Self {
            max_attempts,
            window: Duration::from_secs(window_secs),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Record an attempt for `key`, rejecting it if the window is exhausted.
    pub fn check(&self, key: &str) -> Result<(), String> {
        let now = Instant::now();
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        let entry = attempts.entry(key.to_string()).or_default();
        entry.retain(|t| now.duration_since(*t) < self.window);

        if entry.len() >= self.max_attempts {
            let oldest = entry[0];
            let retry_after = self.window.saturating_sub(now.duration_since(oldest));
            return Err(format!(
                "Rate limit exceeded: try again in {} seconds",
                retry_after.as_secs().max(1)
            ));
        }

        entry.push(now);
        Ok(())
    }

    /// Drop expired attempt records so idle keys do not accumulate.
    pub fn cleanup(&self) {
        let now = Instant::now();
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        attempts.retain(|_, times| {
            times.retain(|t| now.duration_since(*t) < self.window);
            !times.is_empty()
        });
    }
}

impl Default for LoginRateLimiter {
    /// 10 attempts per email per 15 minutes.
    fn default() -> Self {
        Self::new(10, 900)
    }
}
