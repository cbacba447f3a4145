//! Resilience
//!
//! Retry state, rate-limit decisions and the coordinator that turns a
//! classified failure into a retry verdict.

pub mod coordinator;
pub mod decision;
pub mod state;

pub use coordinator::{RetryCoordinator, RetryVerdict, TRANSIENT_STATUS_CODES};
pub use decision::{
    AuthEvent, ChannelDecisionProvider, CountdownOnlyDecisionProvider, DecisionProvider,
    NegotiationDecision, PendingDecision, RateLimitPrompt, ScriptedDecisionProvider,
};
pub use state::{RetryConfig, RetrySnapshot, RetryState};
