//! Retry coordination for classified failures.
//!
//! One [`RetryCoordinator`] is shared by every request of a client. Each
//! failed attempt is evaluated against the shared [`RetryState`] and
//! yields a [`RetryVerdict`]. A 429 may suspend the evaluation in an
//! interactive negotiation; at most one negotiation runs at a time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::decision::{
    AuthEvent, CountdownOnlyDecisionProvider, DecisionProvider, NegotiationDecision,
    RateLimitPrompt,
};
use super::state::{RetryConfig, RetrySnapshot, RetryState};
use crate::error::ClassifiedError;
use crate::types::HttpResponse;

/// Statuses retried like connection errors.
pub const TRANSIENT_STATUS_CODES: &[u16] = &[404, 410, 500, 501, 502, 503, 504];

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// What the caller should do with a failed request.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryVerdict {
    /// Resend immediately.
    Retry,
    /// Resend after the delay.
    RetryAfter(Duration),
    /// Surface the classified error unchanged.
    DoNotRetry,
    /// Surface this error instead.
    DoNotRetryWithError(ClassifiedError),
}

impl RetryVerdict {
    pub fn should_retry(&self) -> bool {
        matches!(self, Self::Retry | Self::RetryAfter(_))
    }
}

enum Resolution {
    Cancelled,
    Decided(NegotiationDecision),
    CountdownElapsed,
}

/// Retry policy shared across the concurrent requests of one client.
#[derive(Clone)]
pub struct RetryCoordinator {
    state: Arc<RetryState>,
    decisions: Arc<dyn DecisionProvider>,
    events: broadcast::Sender<AuthEvent>,
}

impl RetryCoordinator {
    /// Create a coordinator whose negotiations resolve by countdown only.
    pub fn new(config: RetryConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(RetryState::new(config)),
            decisions: Arc::new(CountdownOnlyDecisionProvider),
            events,
        }
    }

    /// Set the provider consulted during rate-limit negotiations.
    pub fn with_decision_provider(mut self, decisions: Arc<dyn DecisionProvider>) -> Self {
        self.decisions = decisions;
        self
    }

    pub fn state(&self) -> &Arc<RetryState> {
        &self.state
    }

    /// Subscribe to rate-limit cancellation and session-expiry events.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Stop all retries, including waits and negotiations in progress.
    pub fn cancel_all(&self) {
        info!("Cancelling all pending retries");
        self.state.cancel_all();
    }

    pub fn resume(&self) {
        self.state.resume();
    }

    pub fn set_rate_limit_retry_enabled(&self, enabled: bool) {
        self.state.set_rate_limit_retry_enabled(enabled);
    }

    pub fn set_max_retry_count(&self, n: u32) {
        self.state.set_max_retry_count(n);
    }

    pub fn set_always_prompt_login_again(&self, always: bool) {
        self.state.set_always_prompt_login_again(always);
    }

    /// Note a successful response, resetting the rate-limit retry count.
    pub fn record_success(&self) {
        self.state.record_success();
    }

    /// Token cancelled by the next [`cancel_all`](Self::cancel_all).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.state.snapshot().cancellation
    }

    /// Decide what to do with one failed attempt.
    ///
    /// `attempt` counts the retries already made for this request, starting
    /// at 0. May suspend while a rate-limit negotiation is active.
    #[instrument(skip(self, error, response), fields(code = error.error_code()))]
    pub async fn evaluate(
        &self,
        error: &ClassifiedError,
        attempt: u32,
        response: Option<&HttpResponse>,
    ) -> RetryVerdict {
        let snapshot = self.state.snapshot();
        if snapshot.is_cancelled_globally {
            debug!("Retries cancelled globally");
            return RetryVerdict::DoNotRetry;
        }

        let status = response.map(|r| r.status);
        let config = &snapshot.config;

        let transient = error.is_connection_error()
            || status.map_or(false, |s| TRANSIENT_STATUS_CODES.contains(&s));
        if transient {
            if attempt >= config.max_retry_count {
                warn!(
                    attempt,
                    max_retries = config.max_retry_count,
                    "Retry limit reached"
                );
                return RetryVerdict::DoNotRetry;
            }
            debug!(
                attempt,
                delay_ms = config.base_retry_delay.as_millis() as u64,
                "Retrying after transient error"
            );
            return RetryVerdict::RetryAfter(config.base_retry_delay);
        }

        let rate_limited = match status {
            Some(s) => s == 429,
            None => matches!(error, ClassifiedError::RateLimited(_)),
        };
        if rate_limited && config.rate_limit_retry_enabled {
            return self.negotiate(error, attempt, &snapshot).await;
        }

        RetryVerdict::DoNotRetry
    }

    async fn negotiate(
        &self,
        error: &ClassifiedError,
        attempt: u32,
        snapshot: &RetrySnapshot,
    ) -> RetryVerdict {
        let config = &snapshot.config;

        let Some(mut guard) = self.state.try_begin_negotiation() else {
            debug!(
                delay_ms = config.negotiation_busy_delay.as_millis() as u64,
                "Rate-limit negotiation already in progress"
            );
            return RetryVerdict::RetryAfter(config.negotiation_busy_delay);
        };

        let retries = self.state.rate_limit_retries();
        if retries >= config.max_rate_limit_negotiations {
            warn!(
                retries,
                max_negotiations = config.max_rate_limit_negotiations,
                "Rate-limit retry limit reached"
            );
            return RetryVerdict::DoNotRetry;
        }

        let wait_seconds = config
            .rate_limit_base_wait_seconds
            .saturating_mul(u64::from(attempt) + 1);
        let prompt = RateLimitPrompt {
            wait_seconds,
            attempt,
            offer_login_again: config.always_prompt_login_again
                || attempt >= config.login_again_threshold,
            reason: error.reason().map(str::to_string),
        };
        info!(
            wait_seconds,
            attempt,
            offer_login_again = prompt.offer_login_again,
            "Rate limited, negotiating retry"
        );

        let cancel = snapshot.cancellation.clone();
        let (countdown_tx, countdown_rx) = watch::channel(wait_seconds);

        let resolution = tokio::select! {
            biased;
            _ = cancel.cancelled() => Resolution::Cancelled,
            decision = self.decisions.ask(prompt, countdown_rx) => Resolution::Decided(decision),
            _ = run_countdown(&countdown_tx, wait_seconds, config.countdown_tick) => {
                Resolution::CountdownElapsed
            }
        };

        let (verdict, event) = match resolution {
            Resolution::Cancelled => (RetryVerdict::DoNotRetry, None),
            Resolution::Decided(NegotiationDecision::Cancel) => {
                (RetryVerdict::DoNotRetry, Some(AuthEvent::RateLimitCancelled))
            }
            Resolution::Decided(NegotiationDecision::RetryNow) => (RetryVerdict::Retry, None),
            Resolution::Decided(NegotiationDecision::LoginAgain) => (
                RetryVerdict::DoNotRetryWithError(ClassifiedError::Canceled),
                Some(AuthEvent::SessionExpired),
            ),
            Resolution::Decided(NegotiationDecision::TimedOut) | Resolution::CountdownElapsed => {
                let verdict = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => RetryVerdict::DoNotRetry,
                    _ = tokio::time::sleep(config.settle_delay) => RetryVerdict::Retry,
                };
                (verdict, None)
            }
        };

        if verdict.should_retry() {
            self.state.record_rate_limit_retry();
        }
        guard.release();

        if self.state.is_cancelled_globally() {
            debug!("Negotiation ended after global cancellation");
            return RetryVerdict::DoNotRetry;
        }

        if let Some(event) = event {
            let _ = self.events.send(event);
        }

        debug!(verdict = ?verdict, "Rate-limit negotiation resolved");
        verdict
    }
}

impl std::fmt::Debug for RetryCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryCoordinator")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Default for RetryCoordinator {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

/// Count `wait_seconds` down to zero, one tick per second.
async fn run_countdown(tx: &watch::Sender<u64>, wait_seconds: u64, tick: Duration) {
    let mut remaining = wait_seconds;
    while remaining > 0 {
        tokio::time::sleep(tick).await;
        remaining -= 1;
        tx.send_replace(remaining);
    }
}
