//! Nonce and timestamp sources for OAuth 1.0a signatures.

use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::Mutex;

/// Nonce source (for dependency injection).
pub trait NonceGenerator: Send + Sync {
    /// Produce a token that is unique per request.
    fn generate(&self) -> String;
}

/// Random UUID v4 with separators stripped.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidNonceGenerator;

impl NonceGenerator for UuidNonceGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Nonce generator returning queued values, then a fixed fallback.
#[derive(Default)]
pub struct FixedNonceGenerator {
    queued: Mutex<Vec<String>>,
    fallback: String,
}

impl FixedNonceGenerator {
    /// Always return `nonce`.
    pub fn new(nonce: impl Into<String>) -> Self {
        Self {
            queued: Mutex::new(Vec::new()),
            fallback: nonce.into(),
        }
    }

    /// Queue a one-off nonce returned before the fallback.
    pub fn push(&self, nonce: impl Into<String>) -> &Self {
        self.queued.lock().insert(0, nonce.into());
        self
    }
}

impl NonceGenerator for FixedNonceGenerator {
    fn generate(&self) -> String {
        self.queued
            .lock()
            .pop()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Clock (for dependency injection).
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn unix_timestamp(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_timestamp(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Clock frozen at a settable instant.
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    pub fn new(timestamp: i64) -> Self {
        Self {
            now: AtomicI64::new(timestamp),
        }
    }

    pub fn set(&self, timestamp: i64) {
        self.now.store(timestamp, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn unix_timestamp(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uuid_nonce_is_unique_and_unseparated() {
        let generator = UuidNonceGenerator;
        let nonces: HashSet<String> = (0..100).map(|_| generator.generate()).collect();
        assert_eq!(nonces.len(), 100);
        for nonce in &nonces {
            assert_eq!(nonce.len(), 32);
            assert!(!nonce.contains('-'));
        }
    }

    #[test]
    fn test_fixed_nonce_queue_then_fallback() {
        let generator = FixedNonceGenerator::new("fallback");
        generator.push("first").push("second");
        assert_eq!(generator.generate(), "first");
        assert_eq!(generator.generate(), "second");
        assert_eq!(generator.generate(), "fallback");
    }

    #[test]
    fn test_system_clock_is_recent() {
        // 2023-11-14
        assert!(SystemClock.unix_timestamp() > 1_700_000_000);
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::new(42);
        assert_eq!(clock.unix_timestamp(), 42);
        clock.set(43);
        assert_eq!(clock.unix_timestamp(), 43);
    }
}
