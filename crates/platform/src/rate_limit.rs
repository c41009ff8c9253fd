//! Rate Limiting Infrastructure
//!
//! Fixed-window request counting keyed by opaque caller-built strings
//! (typically `clientIdentity:route` — key construction is the caller's
//! responsibility, the limiter itself is key-agnostic).
//!
//! ## Limitation
//! A fixed window can admit up to `2 * max_requests` across a window
//! boundary. This is an accepted trade-off of the strategy; callers that
//! need hard guarantees must layer a stricter algorithm on top.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::task::JoinHandle;

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }
}

/// Rate limit check result
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at_ms: i64,
    /// Seconds until the window resets; present only on denial
    pub retry_after_secs: Option<u64>,
}

/// Aggregate limiter counters for observability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterStats {
    /// Buckets currently held in memory
    pub active_buckets: usize,
    /// Total number of check decisions made since construction
    pub total_requests: u64,
}

/// Trait for rate limit storage backends
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    /// Check and increment the counter for `key` under `config`
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, Box<dyn std::error::Error + Send + Sync>>;
}

// ============================================================================
// Fixed-window in-memory limiter
// ============================================================================

#[derive(Debug)]
struct Bucket {
    count: u32,
    window_start_ms: i64,
    window_ms: i64,
}

impl Bucket {
    fn new(now_ms: i64, window_ms: i64) -> Self {
        Self {
            count: 0,
            window_start_ms: now_ms,
            window_ms,
        }
    }

    fn is_expired(&self, now_ms: i64) -> bool {
        now_ms - self.window_start_ms >= self.window_ms
    }
}

#[derive(Debug, Default)]
struct LimiterShared {
    buckets: Mutex<HashMap<String, Bucket>>,
    total_requests: AtomicU64,
}

impl LimiterShared {
    fn lock_buckets(&self) -> MutexGuard<'_, HashMap<String, Bucket>> {
        // Recover from poisoning: bucket state stays consistent under any
        // single mutation.
        match self.buckets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn sweep(&self) {
        let now = now_ms();
        self.lock_buckets().retain(|_, b| !b.is_expired(now));
    }
}

/// In-memory fixed-window rate limiter
///
/// Buckets are created on first hit, replaced once their window has
/// elapsed, and garbage-collected by the periodic sweep. Safe to share
/// across tasks.
pub struct FixedWindowLimiter {
    shared: Arc<LimiterShared>,
    default_config: RateLimitConfig,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl FixedWindowLimiter {
    /// Create a limiter without a background sweep
    pub fn new(default_config: RateLimitConfig) -> Self {
        Self {
            shared: Arc::new(LimiterShared::default()),
            default_config,
            sweeper: Mutex::new(None),
        }
    }

    /// Create a limiter and start the periodic sweep task
    ///
    /// The sweep interval is independent of any bucket window. The task
    /// holds only a weak reference, so dropping the limiter ends it.
    /// Must be called from within a tokio runtime.
    pub fn with_sweeper(default_config: RateLimitConfig, sweep_interval: Duration) -> Self {
        let limiter = Self::new(default_config);

        let shared = Arc::downgrade(&limiter.shared);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(shared) = shared.upgrade() else {
                    break;
                };
                shared.sweep();
            }
        });

        if let Ok(mut sweeper) = limiter.sweeper.lock() {
            *sweeper = Some(handle);
        }
        limiter
    }

    /// Check `key` against the process-wide default config
    pub fn check(&self, key: &str) -> RateLimitResult {
        self.check_with(key, &self.default_config)
    }

    /// Check `key` against a per-call config (e.g. a stricter login limit)
    pub fn check_with(&self, key: &str, config: &RateLimitConfig) -> RateLimitResult {
        let now = now_ms();
        self.shared.total_requests.fetch_add(1, Ordering::Relaxed);

        let mut buckets = self.shared.lock_buckets();
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::new(now, config.window_ms()));
        if bucket.is_expired(now) {
            *bucket = Bucket::new(now, config.window_ms());
        }
        bucket.count += 1;

        let reset_at_ms = bucket.window_start_ms + bucket.window_ms;
        if bucket.count > config.max_requests {
            let retry_after_secs = ((reset_at_ms - now).max(0) as u64).div_ceil(1000);
            RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_at_ms,
                retry_after_secs: Some(retry_after_secs),
            }
        } else {
            RateLimitResult {
                allowed: true,
                remaining: config.max_requests - bucket.count,
                reset_at_ms,
                retry_after_secs: None,
            }
        }
    }

    /// Bump a bucket without an allow/deny decision
    ///
    /// Used to penalize a detected abuse pattern out-of-band. Creates the
    /// bucket under the default window if absent. Does not count toward
    /// `stats().total_requests`.
    pub fn increment(&self, key: &str) {
        let now = now_ms();
        let window_ms = self.default_config.window_ms();

        let mut buckets = self.shared.lock_buckets();
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::new(now, window_ms));
        if bucket.is_expired(now) {
            *bucket = Bucket::new(now, window_ms);
        }
        bucket.count += 1;
    }

    /// Clear one bucket immediately (e.g. after a legitimate unlock)
    pub fn reset(&self, key: &str) {
        self.shared.lock_buckets().remove(key);
    }

    /// Aggregate counters
    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            active_buckets: self.shared.lock_buckets().len(),
            total_requests: self.shared.total_requests.load(Ordering::Relaxed),
        }
    }

    /// Stop the sweep task and clear all state
    ///
    /// Required for clean shutdown and test isolation.
    pub fn destroy(&self) {
        if let Ok(mut sweeper) = self.sweeper.lock() {
            if let Some(handle) = sweeper.take() {
                handle.abort();
            }
        }
        self.shared.lock_buckets().clear();
        self.shared.total_requests.store(0, Ordering::Relaxed);
    }
}

impl Drop for FixedWindowLimiter {
    fn drop(&mut self) {
        if let Ok(mut sweeper) = self.sweeper.lock() {
            if let Some(handle) = sweeper.take() {
                handle.abort();
            }
        }
    }
}

impl RateLimitStore for FixedWindowLimiter {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.check_with(key, config))
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

// ============================================================================
// Tests
// ============================================================================
