//! Rate-limit decisions
//!
//! The interactive part of a rate-limit negotiation is delegated to a
//! [`DecisionProvider`]. Production hosts render a prompt with a live
//! countdown; tests script the answer.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};

/// What the host is asked while a rate limit is being negotiated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPrompt {
    /// Initial countdown length.
    pub wait_seconds: u64,
    /// Attempt count of the rate-limited request.
    pub attempt: u32,
    /// Whether "login again" should be offered.
    pub offer_login_again: bool,
    /// Message returned by the service, if any.
    pub reason: Option<String>,
}

/// Answer to a [`RateLimitPrompt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationDecision {
    Cancel,
    RetryNow,
    LoginAgain,
    /// The host let the countdown run out.
    TimedOut,
}

/// Notifications surfaced to the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// The user cancelled a rate-limit negotiation.
    RateLimitCancelled,
    /// The user chose to sign in again.
    SessionExpired,
}

/// Decision provider interface.
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    /// Ask for a decision. `countdown` carries the remaining seconds.
    ///
    /// The future may never complete; the negotiation's own countdown
    /// resolves it in that case.
    async fn ask(
        &self,
        prompt: RateLimitPrompt,
        countdown: watch::Receiver<u64>,
    ) -> NegotiationDecision;
}

/// Provider that never answers, leaving every negotiation to its countdown.
#[derive(Debug, Default, Clone, Copy)]
pub struct CountdownOnlyDecisionProvider;

#[async_trait]
impl DecisionProvider for CountdownOnlyDecisionProvider {
    async fn ask(
        &self,
        _prompt: RateLimitPrompt,
        _countdown: watch::Receiver<u64>,
    ) -> NegotiationDecision {
        std::future::pending().await
    }
}

/// A prompt waiting for the host's answer.
pub struct PendingDecision {
    prompt: RateLimitPrompt,
    countdown: watch::Receiver<u64>,
    responder: Mutex<Option<oneshot::Sender<NegotiationDecision>>>,
}

impl PendingDecision {
    pub fn prompt(&self) -> &RateLimitPrompt {
        &self.prompt
    }

    /// Seconds left before the negotiation retries on its own.
    pub fn remaining_seconds(&self) -> u64 {
        *self.countdown.borrow()
    }

    /// Live countdown, for rendering.
    pub fn countdown(&self) -> watch::Receiver<u64> {
        self.countdown.clone()
    }

    /// Deliver a decision. Only the first call has an effect.
    ///
    /// Returns `false` if a decision was already delivered or the
    /// negotiation has already ended.
    pub fn resolve(&self, decision: NegotiationDecision) -> bool {
        match self.responder.lock().take() {
            Some(sender) => sender.send(decision).is_ok(),
            None => false,
        }
    }

    pub fn cancel(&self) -> bool {
        self.resolve(NegotiationDecision::Cancel)
    }

    pub fn retry_now(&self) -> bool {
        self.resolve(NegotiationDecision::RetryNow)
    }

    pub fn login_again(&self) -> bool {
        self.resolve(NegotiationDecision::LoginAgain)
    }
}

impl std::fmt::Debug for PendingDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingDecision")
            .field("prompt", &self.prompt)
            .field("remaining_seconds", &self.remaining_seconds())
            .finish()
    }
}

/// Forwards prompts to the host over a channel.
///
/// If the host is not listening, or drops the [`PendingDecision`] without
/// resolving it, the countdown decides.
#[derive(Debug, Clone)]
pub struct ChannelDecisionProvider {
    sender: mpsc::Sender<PendingDecision>,
}

impl ChannelDecisionProvider {
    /// Create a provider and the receiver the host reads prompts from.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<PendingDecision>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl DecisionProvider for ChannelDecisionProvider {
    async fn ask(
        &self,
        prompt: RateLimitPrompt,
        countdown: watch::Receiver<u64>,
    ) -> NegotiationDecision {
        let (tx, rx) = oneshot::channel();
        let pending = PendingDecision {
            prompt,
            countdown,
            responder: Mutex::new(Some(tx)),
        };

        if self.sender.send(pending).await.is_err() {
            tracing::debug!("No decision listener, waiting for countdown");
            return std::future::pending().await;
        }

        match rx.await {
            Ok(decision) => decision,
            Err(_) => std::future::pending().await,
        }
    }
}

/// Scripted decision provider for testing.
///
/// Answers with queued decisions, each after an optional delay. With an
/// empty queue it never answers.
#[derive(Default)]
pub struct ScriptedDecisionProvider {
    script: Mutex<VecDeque<(Duration, NegotiationDecision)>>,
    prompts: Mutex<Vec<RateLimitPrompt>>,
}

impl ScriptedDecisionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an immediate answer.
    pub fn push(&self, decision: NegotiationDecision) -> &Self {
        self.push_after(Duration::ZERO, decision)
    }

    /// Queue an answer given after `delay`.
    pub fn push_after(&self, delay: Duration, decision: NegotiationDecision) -> &Self {
        self.script.lock().push_back((delay, decision));
        self
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<RateLimitPrompt> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl DecisionProvider for ScriptedDecisionProvider {
    async fn ask(
        &self,
        prompt: RateLimitPrompt,
        _countdown: watch::Receiver<u64>,
    ) -> NegotiationDecision {
        self.prompts.lock().push(prompt);
        let next = self.script.lock().pop_front();
        match next {
            Some((delay, decision)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                decision
            }
            None => std::future::pending().await,
        }
    }
}
