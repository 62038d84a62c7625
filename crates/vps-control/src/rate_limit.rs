//! Per-(owner, resource) admission control for action submission.
//!
//! One action per resource per owner per window. The in-memory limiter
//! keeps the last admitted submission time per key; check and record
//! happen under one lock so two concurrent submissions for the same key
//! cannot both be admitted inside a window.
//!
//! # Memory Management
//!
//! There is no background timer. When the map grows past
//! `sweep_threshold`, the admitting call sweeps every entry older than
//! twice the window.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rate limited, retry after {retry_after_secs}s")]
pub struct RateLimited {
    pub retry_after_secs: u64,
}

/// Admission gate consulted immediately before an action is submitted.
pub trait RateLimiter: Send + Sync + 'static {
    /// Admit and record a submission for `(owner_id, resource_id)`, or
    /// reject it with the time left in the current window.
    fn check_and_record(&self, owner_id: Uuid, resource_id: Uuid) -> Result<(), RateLimited>;
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Minimum spacing between two admitted submissions for one key.
    pub window: Duration,

    /// Map size above which an admitting call sweeps stale entries.
    pub sweep_threshold: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            sweep_threshold: 1024,
        }
    }
}

/// Process-local limiter. Suitable for single-instance deployments.
pub struct InMemoryRateLimiter {
    config: RateLimitConfig,
    entries: Mutex<HashMap<(Uuid, Uuid), Instant>>,
}

impl InMemoryRateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of keys currently tracked.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn sweep(&self, entries: &mut HashMap<(Uuid, Uuid), Instant>, now: Instant) {
        let stale_after = self.config.window.saturating_mul(2);
        let before = entries.len();
        entries.retain(|_, last| now.saturating_duration_since(*last) < stale_after);
        tracing::debug!(
            before,
            after = entries.len(),
            "swept stale rate limit entries"
        );
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn check_and_record(&self, owner_id: Uuid, resource_id: Uuid) -> Result<(), RateLimited> {
        let now = Instant::now();
        let key = (owner_id, resource_id);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(last) = entries.get(&key) {
            let elapsed = now.saturating_duration_since(*last);
            if elapsed < self.config.window {
                let remaining = self.config.window - elapsed;
                let retry_after_secs = u64::try_from(remaining.as_millis().div_ceil(1000))
                    .unwrap_or(u64::MAX)
                    .max(1);
                return Err(RateLimited { retry_after_secs });
            }
        }

        entries.insert(key, now);

        if entries.len() > self.config.sweep_threshold {
            self.sweep(&mut entries, now);
        }

        Ok(())
    }
}
