//! Per-IP login rate limiting.
//!
//! Backed by governor's GCRA limiter with a keyed DashMap state store: the
//! configured budget allows a burst of `max_attempts` per source address,
//! refilling evenly across the window. The key map is shrunk periodically so
//! one-off addresses do not accumulate forever.

use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::keyed::DashMapStateStore,
};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::{Error, Result};

/// Drop stale per-IP state every this many checks.
const SHRINK_INTERVAL: u64 = 1000;

/// Login attempt budget per source address.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRateLimitConfig {
    pub max_attempts: u32,
    pub window_seconds: u64,
}

impl Default for LoginRateLimitConfig {
    fn default() -> Self {
        // 5 attempts per 15 minutes
        Self {
            max_attempts: 5,
            window_seconds: 900,
        }
    }
}

impl LoginRateLimitConfig {
    pub fn new(max_attempts: u32, window_seconds: u64) -> Self {
        Self {
            max_attempts,
            window_seconds,
        }
    }
}

/// Keyed rate limiter guarding the login endpoint.
#[derive(Clone)]
pub struct LoginRateLimiter {
    limiter: Arc<RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock>>,
    clock: DefaultClock,
    checks: Arc<AtomicU64>,
}

impl LoginRateLimiter {
    pub fn new(config: &LoginRateLimitConfig) -> Self {
        let burst = NonZeroU32::new(config.max_attempts.max(1)).unwrap_or(NonZeroU32::MIN);

        // max_attempts per window, replenishing one attempt per window once
        // the burst is spent
        let quota = Quota::with_period(Duration::from_secs(config.window_seconds.max(1)))
            .unwrap_or_else(|| Quota::per_minute(burst))
            .allow_burst(burst);

        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            clock: DefaultClock::default(),
            checks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record a login attempt from `ip`, rejecting when the budget is spent.
    pub fn check(&self, ip: IpAddr) -> Result<()> {
        if self.checks.fetch_add(1, Ordering::Relaxed) % SHRINK_INTERVAL == SHRINK_INTERVAL - 1 {
            self.limiter.retain_recent();
        }

        match self.limiter.check_key(&ip) {
            Ok(_) => Ok(()),
            Err(not_until) => {
                let retry_after = not_until.wait_time_from(self.clock.now()).as_secs().max(1);
                tracing::warn!(%ip, retry_after, "login rate limit exceeded");
                Err(Error::TooManyRequests(format!(
                    "Too many login attempts. Please try again in {} seconds.",
                    retry_after
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([10, 0, 0, last])
    }

    #[test]
    fn allows_up_to_the_budget_then_rejects() {
        let limiter = LoginRateLimiter::new(&LoginRateLimitConfig::new(5, 900));

        for _ in 0..5 {
            assert!(limiter.check(ip(1)).is_ok());
        }
        let err = limiter.check(ip(1)).unwrap_err();
        assert!(matches!(err, Error::TooManyRequests(_)));
        assert!(err.to_string().contains("Too many login attempts"));
    }

    #[test]
    fn addresses_are_limited_independently() {
        let limiter = LoginRateLimiter::new(&LoginRateLimitConfig::new(2, 900));

        assert!(limiter.check(ip(1)).is_ok());
        assert!(limiter.check(ip(1)).is_ok());
        assert!(limiter.check(ip(1)).is_err());

        assert!(limiter.check(ip(2)).is_ok());
    }

    #[test]
    fn default_budget_is_five_per_fifteen_minutes() {
        let config = LoginRateLimitConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.window_seconds, 900);
    }
}
