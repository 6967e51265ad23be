//! Error types for record loading, editing, and correction runs.

use crate::editor::{EditorEvent, EditorState};
use crate::store::RecordId;
use thiserror::Error;
use wand_rs_protocol::{ProviderError, UnknownRole};

/// Uploaded bytes could not be turned into records.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("records are not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("records are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Top level parsed, but is not an array.
    #[error("expected a JSON array of records, found {found}")]
    NotASequence { found: &'static str },
    #[error("record {position} is not an object")]
    NotAnObject { position: usize },
    #[error("record {position} is missing `{field}`")]
    MissingField {
        position: usize,
        field: &'static str,
    },
    #[error("record {position}: `{field}` must be a string")]
    WrongType {
        position: usize,
        field: &'static str,
    },
    #[error("record {position}: {source}")]
    UnknownRole {
        position: usize,
        #[source]
        source: UnknownRole,
    },
}

/// A structural mutation referenced a record that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("index {index} out of range for {len} records")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("unknown record: {0}")]
    UnknownRecord(RecordId),
}

/// Errors returned by the editor state machine.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The event is not accepted in the current state; the state is unchanged.
    #[error("event {event:?} is not valid while {state:?}")]
    InvalidTransition {
        state: EditorState,
        event: EditorEvent,
    },
    /// A correction run is in flight.
    #[error("a correction run is already in progress")]
    CorrectionInProgress,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Terminal failure of a correction run. No partial results survive it.
#[derive(Debug, Error)]
pub enum CorrectionError {
    /// The provider failed while handling the record at `position`.
    #[error("provider failed on record {position}: {source}")]
    ServiceFailure {
        position: usize,
        #[source]
        source: ProviderError,
    },
    /// Cancelled before the record at `position` was submitted.
    #[error("correction run cancelled before record {position}")]
    Cancelled { position: usize },
    /// The background task running the pipeline panicked or was aborted.
    #[error("correction task failed: {0}")]
    Join(String),
}

impl CorrectionError {
    /// Message shown to the user when a run is discarded.
    pub fn user_message(&self) -> &'static str {
        match self {
            CorrectionError::Cancelled { .. } => "Correction cancelled. No changes were recorded.",
            CorrectionError::ServiceFailure { .. } | CorrectionError::Join(_) => {
                "Error processing records. Please try again later."
            }
        }
    }
}
