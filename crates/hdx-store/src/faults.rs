//! Failure simulation shared by the in-memory backends.
//!
//! The in-memory content store and naming service stand in for remote
//! services in tests and demos. [`Faults`] lets a caller make them behave
//! like a slow or unreachable remote: switch the backend offline, fail
//! reads of specific keys, or add latency to every call.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Switchable failure modes for an in-memory backend.
#[derive(Debug, Default)]
pub struct Faults {
    offline: AtomicBool,
    latency_ms: AtomicU64,
    failing: RwLock<HashSet<String>>,
}

impl Faults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the backend were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// Delay every call by `latency` before it is served.
    pub fn set_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(ms, Ordering::SeqCst);
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms.load(Ordering::SeqCst))
    }

    /// Fail reads of `key` with a network error until [`Faults::clear`].
    pub fn fail_key(&self, key: impl Into<String>) {
        self.failing
            .write()
            .expect("faults lock poisoned")
            .insert(key.into());
    }

    pub fn is_failing(&self, key: &str) -> bool {
        self.failing
            .read()
            .expect("faults lock poisoned")
            .contains(key)
    }

    /// Reset every failure mode.
    pub fn clear(&self) {
        self.set_offline(false);
        self.set_latency(Duration::ZERO);
        self.failing.write().expect("faults lock poisoned").clear();
    }

    /// Sleep for the configured latency, if any.
    pub async fn delay(&self) {
        let latency = self.latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}
