//! Per-client rate limiting
//!
//! Every client key gets its own token bucket holding `max_requests` tokens
//! that refill evenly over `window`. A fresh client can therefore burst the
//! whole quota at once and is then held to the average rate.
//!
//! The client key is whatever the front end derives from the request
//! (forwarded-for header plus peer address).
//!
//! ## Configuration Example
//!
//! ```yaml
//! rate_limit:
//!   enabled: true
//!   max_requests: 300
//!   window_seconds: 60
//! ```

use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

use crate::config::RateLimitConfig;

/// Maximum number of per-client rate limiters to track before cleanup
const DEFAULT_MAX_CLIENT_LIMITERS: usize = 100_000;
/// Default TTL for idle rate limiters (5 minutes)
const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(5 * 60);
/// Default cleanup interval (1 minute)
const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// A rate limiter entry with last access tracking for TTL-based eviction
struct TrackedLimiter {
    limiter: Arc<DirectLimiter>,
    last_accessed: Instant,
}

/// Rate limit errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateLimitError {
    #[error("rate limit exceeded")]
    Exceeded,
}

/// Per-client limiter registry
pub struct RateLimitManager {
    clients: Arc<RwLock<HashMap<String, TrackedLimiter>>>,
    quota: Quota,
    max_client_limiters: usize,
    idle_ttl: Duration,
    /// Cleanup task shutdown sender (Some when task is running)
    cleanup_shutdown: Arc<RwLock<Option<oneshot::Sender<()>>>>,
}

impl RateLimitManager {
    /// Allow `max_requests` per `window` for each client.
    ///
    /// Returns `None` when either value is zero.
    pub fn new(max_requests: u32, window: Duration) -> Option<Self> {
        let burst = NonZeroU32::new(max_requests)?;
        let quota = Quota::with_period(window / max_requests)?.allow_burst(burst);

        Some(Self {
            clients: Arc::new(RwLock::new(HashMap::new())),
            quota,
            max_client_limiters: DEFAULT_MAX_CLIENT_LIMITERS,
            idle_ttl: DEFAULT_IDLE_TTL,
            cleanup_shutdown: Arc::new(RwLock::new(None)),
        })
    }

    /// Build from config, `None` when rate limiting is disabled.
    pub fn from_config(config: &RateLimitConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        Self::new(config.max_requests, config.window())
    }

    /// Check if a request from `client_key` should be allowed
    ///
    /// If the number of tracked clients exceeds `max_client_limiters`, all
    /// entries are cleared to prevent unbounded memory growth.
    pub fn check(&self, client_key: &str) -> Result<(), RateLimitError> {
        let mut limiters = self.clients.write();

        if limiters.len() >= self.max_client_limiters && !limiters.contains_key(client_key) {
            tracing::warn!(
                client_count = limiters.len(),
                max_clients = self.max_client_limiters,
                "Client rate limiter count exceeded max, clearing all"
            );
            limiters.clear();
        }

        let quota = self.quota;
        let entry = limiters
            .entry(client_key.to_string())
            .or_insert_with(|| TrackedLimiter {
                limiter: Arc::new(RateLimiter::direct(quota)),
                last_accessed: Instant::now(),
            });

        // Update last accessed time to prevent TTL eviction
        entry.last_accessed = Instant::now();
        entry
            .limiter
            .check()
            .map_err(|_| RateLimitError::Exceeded)
    }

    /// Number of clients currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.clients.read().len()
    }

    /// Start the background cleanup task that evicts idle rate limiters
    ///
    /// Calling this more than once is a no-op while a task is running.
    pub fn start_cleanup_task(&self, interval: Option<Duration>) {
        let interval = interval.unwrap_or(DEFAULT_CLEANUP_INTERVAL);
        let clients = Arc::clone(&self.clients);
        let idle_ttl = self.idle_ttl;

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        {
            let mut guard = self.cleanup_shutdown.write();
            if guard.is_some() {
                tracing::debug!(
                    "Rate limiter cleanup task already running, skipping duplicate start"
                );
                return;
            }
            *guard = Some(shutdown_tx);
        }

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        evict_idle(&clients, idle_ttl);
                    }
                    _ = &mut shutdown_rx => {
                        tracing::debug!("Rate limiter cleanup task shutting down");
                        break;
                    }
                }
            }
        });

        tracing::info!(
            interval_secs = interval.as_secs(),
            idle_ttl_secs = idle_ttl.as_secs(),
            "Started rate limiter cleanup task"
        );
    }

    /// Stop the background cleanup task
    pub fn stop_cleanup_task(&self) {
        if let Some(shutdown_tx) = self.cleanup_shutdown.write().take() {
            let _ = shutdown_tx.send(());
        }
    }
}

impl Drop for RateLimitManager {
    fn drop(&mut self) {
        self.stop_cleanup_task();
    }
}

/// Two-phase eviction: collect under the read lock, remove under the write lock.
fn evict_idle(clients: &RwLock<HashMap<String, TrackedLimiter>>, idle_ttl: Duration) {
    let now = Instant::now();

    let expired: Vec<String> = {
        let guard = clients.read();
        guard
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.last_accessed) >= idle_ttl)
            .map(|(key, _)| key.clone())
            .collect()
    };

    if expired.is_empty() {
        return;
    }

    let mut guard = clients.write();
    for key in &expired {
        guard.remove(key);
    }
    tracing::debug!(
        evicted_clients = expired.len(),
        remaining_clients = guard.len(),
        "Evicted idle client rate limiters"
    );
}
