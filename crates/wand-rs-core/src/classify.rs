//! Turning a raw completion into a correction decision.

use wand_rs_protocol::{Completion, FinishReason};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The model proposed this (trimmed) replacement text.
    Changed(String),
    /// The model answered with the no-change marker.
    NoChange,
    /// The model did not stop normally; the answer is ignored.
    Incomplete(FinishReason),
}

/// Classify a completion against the run's no-change marker.
///
/// The marker matches case-insensitively anywhere in the trimmed answer.
pub fn classify(completion: &Completion, marker: &str) -> Classification {
    if !completion.finish_reason.is_stop() {
        return Classification::Incomplete(completion.finish_reason.clone());
    }
    let amended = completion.text.trim();
    if amended.to_uppercase().contains(&marker.to_uppercase()) {
        Classification::NoChange
    } else {
        Classification::Changed(amended.to_string())
    }
}
