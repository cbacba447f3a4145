//! Per-platform classifier strategies.
//!
//! Target APIs differ in how they signal checkpoints and where they put
//! error messages; both are injected into the classifier.

use serde_json::Value;

/// Body fields checked for an error message, in priority order.
pub const DEFAULT_MESSAGE_POINTERS: &[&str] = &[
    "/message",
    "/meta/error_message",
    "/error/message",
    "/error_message",
    "/feedback_message",
    "/error_title",
];

/// Decides whether a response is a platform checkpoint challenge.
#[cfg_attr(test, mockall::automock)]
pub trait CheckpointPredicate: Send + Sync {
    fn is_checkpoint(&self, status: Option<u16>, body: &Value) -> bool;
}

/// Platforms without checkpoints.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverCheckpoint;

impl CheckpointPredicate for NeverCheckpoint {
    fn is_checkpoint(&self, _status: Option<u16>, _body: &Value) -> bool {
        false
    }
}

/// Checkpoint signalled by a string field holding a known value,
/// e.g. `{"message": "checkpoint_required"}`.
#[derive(Debug, Clone)]
pub struct FieldCheckpointPredicate {
    pointer: String,
    expected: String,
}

impl FieldCheckpointPredicate {
    /// `pointer` is a JSON pointer such as `/message`.
    pub fn new(pointer: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            expected: expected.into(),
        }
    }
}

impl CheckpointPredicate for FieldCheckpointPredicate {
    fn is_checkpoint(&self, _status: Option<u16>, body: &Value) -> bool {
        body.pointer(&self.pointer).and_then(Value::as_str) == Some(self.expected.as_str())
    }
}

/// Pulls a human-readable error message out of a response body.
#[cfg_attr(test, mockall::automock)]
pub trait MessageExtractor: Send + Sync {
    fn extract(&self, body: &Value) -> Option<String>;
}

/// Returns the first string found at an ordered list of JSON pointers.
#[derive(Debug, Clone)]
pub struct JsonPointerMessageExtractor {
    pointers: Vec<String>,
}

impl JsonPointerMessageExtractor {
    pub fn new<I, S>(pointers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pointers: pointers.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for JsonPointerMessageExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGE_POINTERS.iter().copied())
    }
}

impl MessageExtractor for JsonPointerMessageExtractor {
    fn extract(&self, body: &Value) -> Option<String> {
        self.pointers
            .iter()
            .find_map(|p| body.pointer(p).and_then(Value::as_str))
            .map(str::to_string)
    }
}
