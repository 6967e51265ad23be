//! Wire protocol types for transcript records, corrections, and run events.

mod provider;
mod record;

pub use provider::{Completion, CompletionProvider, FinishReason, ProviderError};
pub use record::{CorrectionResult, Record, Role, UnknownRole};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a correction run.
pub type RunId = Uuid;

/// Wrapper for events emitted while a correction run progresses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    /// Unique id for the event.
    pub id: Uuid,
    /// Run the event belongs to.
    pub run_id: RunId,
    /// Timestamp when the event was created.
    pub created_at: DateTime<Utc>,
    /// Event payload content.
    pub payload: RunEventPayload,
}

impl RunEvent {
    /// Stamp a payload with a fresh id and the current time.
    pub fn new(run_id: RunId, payload: RunEventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_id,
            created_at: Utc::now(),
            payload,
        }
    }
}

/// All events emitted during a correction run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum RunEventPayload {
    /// Run accepted a snapshot of `total` records.
    RunStarted { total: usize },
    /// Prompt for the record at `position` was sent to the provider.
    RecordSubmitted { position: usize, role: Role },
    /// Record produced no correction.
    RecordSkipped { position: usize, reason: SkipReason },
    /// Record produced a correction.
    CorrectionProduced { result: CorrectionResult },
    /// Run finished without a hard failure.
    RunCompleted { corrections: usize },
    /// Provider failed; the whole run is discarded.
    RunFailed { position: usize, message: String },
    /// Run was cancelled before the record at `position` was submitted.
    RunCancelled { position: usize },
}

/// Why a record did not yield a correction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "finish_reason")]
pub enum SkipReason {
    /// The model answered with the no-change marker.
    NoChange,
    /// The model stopped for a reason other than a normal stop.
    Incomplete(FinishReason),
}

/// Sink interface for correction run events.
pub trait EventSink: Send + Sync {
    /// Emit an event to downstream listeners.
    fn emit(&self, event: RunEvent);
}
