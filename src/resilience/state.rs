//! Retry State
//!
//! Configuration and flags shared by every in-flight request of one client.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Retry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Transient failures are retried while `attempt < max_retry_count`.
    pub max_retry_count: u32,
    /// Delay before resending after a transient failure.
    pub base_retry_delay: Duration,
    /// Whether 429 responses enter the rate-limit negotiation.
    pub rate_limit_retry_enabled: bool,
    /// Initial negotiation wait is `rate_limit_base_wait_seconds * (attempt + 1)`.
    pub rate_limit_base_wait_seconds: u64,
    /// Offer "login again" on every negotiation.
    pub always_prompt_login_again: bool,
    /// Attempt count from which "login again" is offered.
    pub login_again_threshold: u32,
    /// Delay returned to a 429 that arrives while a negotiation is active.
    pub negotiation_busy_delay: Duration,
    /// Length of one countdown step.
    pub countdown_tick: Duration,
    /// Pause between the countdown reaching zero and the retry.
    pub settle_delay: Duration,
    /// Negotiations that may end in a retry before the next success.
    pub max_rate_limit_negotiations: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retry_count: 3,
            base_retry_delay: Duration::from_secs(1),
            rate_limit_retry_enabled: false,
            rate_limit_base_wait_seconds: 30,
            always_prompt_login_again: false,
            login_again_threshold: 3,
            negotiation_busy_delay: Duration::from_secs(1),
            countdown_tick: Duration::from_secs(1),
            settle_delay: Duration::from_millis(500),
            max_rate_limit_negotiations: 5,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_retry_count(mut self, n: u32) -> Self {
        self.max_retry_count = n;
        self
    }

    pub fn base_retry_delay(mut self, delay: Duration) -> Self {
        self.base_retry_delay = delay;
        self
    }

    pub fn rate_limit_retry_enabled(mut self, enabled: bool) -> Self {
        self.rate_limit_retry_enabled = enabled;
        self
    }

    pub fn rate_limit_base_wait_seconds(mut self, seconds: u64) -> Self {
        self.rate_limit_base_wait_seconds = seconds;
        self
    }

    pub fn always_prompt_login_again(mut self, always: bool) -> Self {
        self.always_prompt_login_again = always;
        self
    }

    pub fn login_again_threshold(mut self, attempts: u32) -> Self {
        self.login_again_threshold = attempts;
        self
    }

    pub fn negotiation_busy_delay(mut self, delay: Duration) -> Self {
        self.negotiation_busy_delay = delay;
        self
    }

    pub fn countdown_tick(mut self, tick: Duration) -> Self {
        self.countdown_tick = tick;
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn max_rate_limit_negotiations(mut self, n: u32) -> Self {
        self.max_rate_limit_negotiations = n;
        self
    }
}

/// Consistent view of the state taken at the start of one evaluation.
#[derive(Debug, Clone)]
pub struct RetrySnapshot {
    pub config: RetryConfig,
    pub is_cancelled_globally: bool,
    pub cancellation: CancellationToken,
}

#[derive(Debug)]
struct Inner {
    config: RetryConfig,
    is_cancelled_globally: bool,
    cancellation: CancellationToken,
    negotiation_in_flight: bool,
    rate_limit_retries: u32,
}

/// Mutable retry state of one client, guarded by a single mutex.
#[derive(Debug)]
pub struct RetryState {
    inner: Mutex<Inner>,
}

impl RetryState {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                config,
                is_cancelled_globally: false,
                cancellation: CancellationToken::new(),
                negotiation_in_flight: false,
                rate_limit_retries: 0,
            }),
        }
    }

    pub fn snapshot(&self) -> RetrySnapshot {
        let inner = self.inner.lock();
        RetrySnapshot {
            config: inner.config.clone(),
            is_cancelled_globally: inner.is_cancelled_globally,
            cancellation: inner.cancellation.clone(),
        }
    }

    pub fn config(&self) -> RetryConfig {
        self.inner.lock().config.clone()
    }

    /// Apply a configuration change atomically.
    pub fn update_config(&self, f: impl FnOnce(&mut RetryConfig)) {
        f(&mut self.inner.lock().config);
    }

    pub fn set_rate_limit_retry_enabled(&self, enabled: bool) {
        self.update_config(|c| c.rate_limit_retry_enabled = enabled);
    }

    pub fn set_max_retry_count(&self, n: u32) {
        self.update_config(|c| c.max_retry_count = n);
    }

    pub fn set_always_prompt_login_again(&self, always: bool) {
        self.update_config(|c| c.always_prompt_login_again = always);
    }

    pub fn is_cancelled_globally(&self) -> bool {
        self.inner.lock().is_cancelled_globally
    }

    /// Stop every pending and future retry, waking in-flight waits.
    pub fn cancel_all(&self) {
        let mut inner = self.inner.lock();
        inner.is_cancelled_globally = true;
        inner.cancellation.cancel();
    }

    /// Clear global cancellation so new requests may retry again.
    pub fn resume(&self) {
        let mut inner = self.inner.lock();
        if inner.is_cancelled_globally {
            inner.is_cancelled_globally = false;
            inner.cancellation = CancellationToken::new();
        }
        inner.rate_limit_retries = 0;
    }

    /// Rate-limit negotiations that ended in a retry since the last success.
    pub fn rate_limit_retries(&self) -> u32 {
        self.inner.lock().rate_limit_retries
    }

    pub(crate) fn record_rate_limit_retry(&self) {
        let mut inner = self.inner.lock();
        inner.rate_limit_retries = inner.rate_limit_retries.saturating_add(1);
    }

    /// Reset the rate-limit retry count after a successful response.
    pub fn record_success(&self) {
        self.inner.lock().rate_limit_retries = 0;
    }

    pub fn is_negotiation_in_flight(&self) -> bool {
        self.inner.lock().negotiation_in_flight
    }

    /// Claim the single negotiation slot, if free.
    pub(crate) fn try_begin_negotiation(self: &Arc<Self>) -> Option<NegotiationGuard> {
        let mut inner = self.inner.lock();
        if inner.negotiation_in_flight {
            return None;
        }
        inner.negotiation_in_flight = true;
        Some(NegotiationGuard {
            state: Arc::clone(self),
            released: false,
        })
    }
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

/// Holds the negotiation slot; released exactly once, explicitly or on drop.
#[derive(Debug)]
pub(crate) struct NegotiationGuard {
    state: Arc<RetryState>,
    released: bool,
}

impl NegotiationGuard {
    pub(crate) fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.state.inner.lock().negotiation_in_flight = false;
    }
}

impl Drop for NegotiationGuard {
    fn drop(&mut self) {
        self.release();
    }
}
