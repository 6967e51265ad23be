//! Batch correction pass over a transcript snapshot.
//!
//! One request per record, strictly in order, one request in flight at a
//! time. A record whose answer is the no-change marker, or whose completion
//! did not stop normally, is skipped. Any provider error aborts the whole run
//! and discards every result gathered so far.

use crate::classify::{Classification, classify};
use crate::error::CorrectionError;
use crate::prompt::CorrectionPrompt;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use wand_rs_config::{CorrectionConfig, DEFAULT_NO_CHANGE_MARKER};
use wand_rs_protocol::{
    CompletionProvider, CorrectionResult, EventSink, Record, RunEvent, RunEventPayload, RunId,
    SkipReason,
};

#[derive(Clone)]
pub struct CorrectionPipeline {
    provider: Arc<dyn CompletionProvider>,
    marker: String,
    event_sink: Option<Arc<dyn EventSink>>,
}

impl CorrectionPipeline {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            marker: DEFAULT_NO_CHANGE_MARKER.to_string(),
            event_sink: None,
        }
    }

    pub fn from_config(config: &CorrectionConfig, provider: Arc<dyn CompletionProvider>) -> Self {
        Self::new(provider).with_marker(config.no_change_marker.clone())
    }

    /// Set the no-change marker. A blank marker would match every answer, so
    /// it is ignored and the current marker is kept.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        let marker = marker.into();
        if marker.trim().is_empty() {
            warn!(
                "ignoring blank no-change marker (keeping={})",
                self.marker
            );
            return self;
        }
        self.marker = marker;
        self
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Correct every record of `records` against `instruction`.
    ///
    /// Either every record was classified and the changed ones are returned in
    /// source order, or the run failed and nothing is returned.
    pub async fn run(
        &self,
        records: &[Record],
        instruction: &str,
    ) -> Result<Vec<CorrectionResult>, CorrectionError> {
        self.run_with_cancel(records, instruction, &CancellationToken::new())
            .await
    }

    /// Like [`CorrectionPipeline::run`], checking `cancel` before each record.
    ///
    /// An in-flight request is always awaited; cancellation takes effect at
    /// the next record boundary.
    pub async fn run_with_cancel(
        &self,
        records: &[Record],
        instruction: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<CorrectionResult>, CorrectionError> {
        self.execute(Uuid::new_v4(), records, instruction, cancel)
            .await
    }

    /// Run on a background task over an owned snapshot.
    pub fn spawn(&self, snapshot: Vec<Record>, instruction: impl Into<String>) -> CorrectionRun {
        let run_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let pipeline = self.clone();
        let instruction = instruction.into();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            pipeline
                .execute(run_id, &snapshot, &instruction, &token)
                .await
        });
        CorrectionRun {
            run_id,
            cancel,
            handle,
        }
    }

    async fn execute(
        &self,
        run_id: RunId,
        records: &[Record],
        instruction: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<CorrectionResult>, CorrectionError> {
        let prompt = CorrectionPrompt::new(instruction, &self.marker);
        info!(
            "starting correction run (run_id={}, records={}, provider={})",
            run_id,
            records.len(),
            self.provider.name()
        );
        self.emit(
            run_id,
            RunEventPayload::RunStarted {
                total: records.len(),
            },
        );

        let mut results = Vec::new();
        for (position, record) in records.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(
                    "correction run cancelled (run_id={}, position={})",
                    run_id, position
                );
                self.emit(run_id, RunEventPayload::RunCancelled { position });
                return Err(CorrectionError::Cancelled { position });
            }

            debug!(
                "submitting record (run_id={}, position={}, role={}, content_len={})",
                run_id,
                position,
                record.role,
                record.content.len()
            );
            self.emit(
                run_id,
                RunEventPayload::RecordSubmitted {
                    position,
                    role: record.role,
                },
            );

            let completion = match self.provider.complete(&prompt.render(record)).await {
                Ok(completion) => completion,
                Err(source) => {
                    warn!(
                        "provider failed; discarding run (run_id={}, position={}, error={})",
                        run_id, position, source
                    );
                    self.emit(
                        run_id,
                        RunEventPayload::RunFailed {
                            position,
                            message: source.to_string(),
                        },
                    );
                    return Err(CorrectionError::ServiceFailure { position, source });
                }
            };

            match classify(&completion, &self.marker) {
                Classification::Changed(amended_text) => {
                    debug!(
                        "record corrected (run_id={}, position={}, amended_len={})",
                        run_id,
                        position,
                        amended_text.len()
                    );
                    let result = CorrectionResult {
                        position,
                        role: record.role,
                        content: record.content.clone(),
                        amended_text,
                    };
                    self.emit(
                        run_id,
                        RunEventPayload::CorrectionProduced {
                            result: result.clone(),
                        },
                    );
                    results.push(result);
                }
                Classification::NoChange => {
                    debug!(
                        "record needs no change (run_id={}, position={})",
                        run_id, position
                    );
                    self.skip(run_id, position, SkipReason::NoChange);
                }
                Classification::Incomplete(reason) => {
                    debug!(
                        "record skipped on finish reason (run_id={}, position={}, finish_reason={})",
                        run_id, position, reason
                    );
                    self.skip(run_id, position, SkipReason::Incomplete(reason));
                }
            }
        }

        info!(
            "correction run completed (run_id={}, records={}, corrections={})",
            run_id,
            records.len(),
            results.len()
        );
        self.emit(
            run_id,
            RunEventPayload::RunCompleted {
                corrections: results.len(),
            },
        );
        Ok(results)
    }

    fn skip(&self, run_id: RunId, position: usize, reason: SkipReason) {
        self.emit(run_id, RunEventPayload::RecordSkipped { position, reason });
    }

    fn emit(&self, run_id: RunId, payload: RunEventPayload) {
        if let Some(sink) = &self.event_sink {
            sink.emit(RunEvent::new(run_id, payload));
        }
    }
}

/// Handle to a correction run executing on a tokio task.
pub struct CorrectionRun {
    run_id: RunId,
    cancel: CancellationToken,
    handle: JoinHandle<Result<Vec<CorrectionResult>, CorrectionError>>,
}

impl CorrectionRun {
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Ask the run to stop before its next record.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Await completion of the run and return its outcome.
    pub async fn finish(self) -> Result<Vec<CorrectionResult>, CorrectionError> {
        self.handle
            .await
            .map_err(|err| CorrectionError::Join(err.to_string()))?
    }
}
