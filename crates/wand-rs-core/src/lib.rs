//! Core editing and correction primitives for wand.
//!
//! This crate owns the record store, the editor state machine, the record
//! file format, and the batch correction pipeline that drives a language
//! model over a transcript snapshot.

pub mod classify;
pub mod editor;
pub mod error;
pub mod format;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod store;

pub use classify::{Classification, classify};
pub use editor::{Editor, EditorEvent, EditorState};
pub use error::{CorrectionError, EditorError, FormatError, StoreError};
pub use format::{parse_records, render_records};
pub use llm::{OpenAiProvider, build_provider};
pub use pipeline::{CorrectionPipeline, CorrectionRun};
pub use prompt::CorrectionPrompt;
pub use store::{RecordId, RecordStore};
/// Cancellation signal accepted by `CorrectionPipeline::run_with_cancel`.
pub use tokio_util::sync::CancellationToken;
