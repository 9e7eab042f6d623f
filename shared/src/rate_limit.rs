//! Fixed-window rate limiting per client key.
//!
//! Counting is delegated to a chain of [`RateLimitStore`]s. The first store that
//! answers decides; a store that errors is logged and skipped, so a broken external
//! store degrades to the in-process counter instead of failing the request.
//!
//! The in-process store only sees requests handled by this instance. With several
//! warm instances each keeps its own count, so the effective limit is multiplied.
//! The external store is what makes the limit global.
//!
//! The in-process store sweeps expired windows at most once per window length and
//! tracks at most [`MEMORY_MAX_KEYS`] clients. Past that, new clients are not
//! counted until a sweep frees room, so a flood of distinct (e.g. spoofed
//! forwarded-for) keys bounds memory at the cost of letting those keys through.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::Result;

/// Length of a counting window.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Requests allowed per client per window.
pub const RATE_LIMIT_MAX_REQUESTS: u64 = 30;

const KEY_PREFIX: &str = "ratelimit:";

/// Evict expired in-process records once the map holds this many keys.
const MEMORY_SWEEP_THRESHOLD: usize = 10_000;

/// Most clients the in-process store tracks at once.
pub const MEMORY_MAX_KEYS: usize = 50_000;

/// Counter storage for rate limiting.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Atomically increment `key` and return the new count. When the count is 1
    /// the key starts a new window that expires after `window`.
    async fn increment(&self, key: &str, window: Duration) -> Result<u64>;

    /// Current count for `key`, or `None` if it has no active window.
    async fn get(&self, key: &str) -> Result<Option<u64>>;
}

#[derive(Debug, Clone, Copy)]
struct WindowRecord {
    count: u64,
    resets_at: Instant,
}

#[derive(Debug, Default)]
struct MemoryRecords {
    windows: HashMap<String, WindowRecord>,
    next_sweep: Option<Instant>,
}

impl MemoryRecords {
    fn sweep_if_due(&mut self, window: Duration, now: Instant) {
        if self.windows.len() < MEMORY_SWEEP_THRESHOLD {
            return;
        }
        if self.next_sweep.is_some_and(|at| now < at) {
            return;
        }

        self.windows.retain(|_, record| now <= record.resets_at);
        self.next_sweep = Some(now + window);
    }
}

/// Rate-limit counters held in this process.
#[derive(Debug)]
pub struct MemoryStore {
    records: Mutex<MemoryRecords>,
    max_keys: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_max_keys(MEMORY_MAX_KEYS)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_keys(max_keys: usize) -> Self {
        Self {
            records: Mutex::new(MemoryRecords::default()),
            max_keys,
        }
    }

    async fn increment_at(&self, key: &str, window: Duration, now: Instant) -> u64 {
        let mut guard = self.records.lock().await;
        let records = &mut *guard;

        records.sweep_if_due(window, now);

        let fresh = WindowRecord {
            count: 1,
            resets_at: now + window,
        };
        let tracked = records.windows.len();

        match records.windows.get_mut(key) {
            Some(record) if now <= record.resets_at => {
                record.count += 1;
                record.count
            }
            Some(record) => {
                *record = fresh;
                1
            }
            None if tracked >= self.max_keys => {
                warn!(
                    tracked,
                    "In-process rate limit store full, not tracking new client"
                );
                1
            }
            None => {
                records.windows.insert(key.to_string(), fresh);
                1
            }
        }
    }

    async fn get_at(&self, key: &str, now: Instant) -> Option<u64> {
        let records = self.records.lock().await;
        records
            .windows
            .get(key)
            .filter(|record| now <= record.resets_at)
            .map(|record| record.count)
    }
}

#[async_trait]
impl RateLimitStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn increment(&self, key: &str, window: Duration) -> Result<u64> {
        Ok(self.increment_at(key, window, Instant::now()).await)
    }

    async fn get(&self, key: &str) -> Result<Option<u64>> {
        Ok(self.get_at(key, Instant::now()).await)
    }
}

/// Decides whether a client has exhausted its request budget.
#[derive(Clone)]
pub struct RateLimiter {
    stores: Vec<Arc<dyn RateLimitStore>>,
    window: Duration,
    max_requests: u64,
}

impl RateLimiter {
    /// Limiter consulting `stores` in order.
    pub fn new(stores: Vec<Arc<dyn RateLimitStore>>) -> Self {
        Self::with_limits(stores, RATE_LIMIT_WINDOW, RATE_LIMIT_MAX_REQUESTS)
    }

    pub fn with_limits(
        stores: Vec<Arc<dyn RateLimitStore>>,
        window: Duration,
        max_requests: u64,
    ) -> Self {
        Self {
            stores,
            window,
            max_requests,
        }
    }

    /// Limiter backed by an optional external store, always ending in the in-process store.
    pub fn with_fallback(primary: Option<Arc<dyn RateLimitStore>>) -> Self {
        let mut stores = Vec::with_capacity(2);
        stores.extend(primary);
        stores.push(Arc::new(MemoryStore::new()) as Arc<dyn RateLimitStore>);
        Self::new(stores)
    }

    pub fn max_requests(&self) -> u64 {
        self.max_requests
    }

    /// Seconds a rejected client should wait: the window length, rounded up.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.window.as_secs();
        if self.window.subsec_nanos() > 0 || secs == 0 {
            secs + 1
        } else {
            secs
        }
    }

    fn key(client_key: &str) -> String {
        format!("{}{}", KEY_PREFIX, client_key)
    }

    /// Count this request against `client_key`; true if it must be rejected.
    ///
    /// Requests up to and including the maximum are allowed; the next one in the
    /// same window is the first rejected.
    pub async fn is_rate_limited(&self, client_key: &str) -> bool {
        let key = Self::key(client_key);

        for store in &self.stores {
            match store.increment(&key, self.window).await {
                Ok(count) => {
                    let limited = count > self.max_requests;
                    if limited {
                        warn!(
                            client = client_key,
                            count,
                            max = self.max_requests,
                            store = store.name(),
                            "Rate limit exceeded"
                        );
                    }
                    return limited;
                }
                Err(e) => {
                    warn!(store = store.name(), error = %e, "Rate limit store failed, trying next");
                }
            }
        }

        error!(client = client_key, "No rate limit store available, allowing request");
        false
    }

    /// Requests counted for `client_key` in its current window.
    pub async fn current_count(&self, client_key: &str) -> Option<u64> {
        let key = Self::key(client_key);

        for store in &self.stores {
            match store.get(&key).await {
                Ok(count) => return count,
                Err(e) => {
                    warn!(store = store.name(), error = %e, "Rate limit store failed, trying next");
                }
            }
        }

        None
    }
}
