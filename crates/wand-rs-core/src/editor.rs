//! Interactive editor state machine over a `RecordStore`.
//!
//! The editor is always in exactly one `EditorState`. Interactive gestures
//! (role picker, drag and drop, the correction dialog) arrive as discrete
//! `EditorEvent`s; direct edits go through the editor so that any state
//! pointing at a removed record is dropped instead of going stale.

use crate::error::{CorrectionError, EditorError, StoreError};
use crate::store::{RecordId, RecordStore};
use log::{debug, info, warn};
use wand_rs_protocol::{CorrectionResult, Record, Role};

/// Shown when an upload cannot be parsed.
pub const LOAD_REJECTED_MESSAGE: &str = "Error parsing JSON file. Please upload a valid JSON file.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorState {
    #[default]
    Idle,
    /// Role picker open for a record.
    EditingRoleAt(RecordId),
    /// Record picked up and not yet dropped.
    Dragging(RecordId),
    /// Correction dialog submitted; a run is in flight.
    AwaitingCorrection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    BeginRoleEdit(RecordId),
    CommitRole(Role),
    CancelRoleEdit,
    BeginDrag(RecordId),
    /// Drop onto the row at this index (remove-then-insert semantics).
    DropAt(usize),
    CancelDrag,
    OpenCorrection,
    CorrectionFinished,
}

#[derive(Debug, Default)]
pub struct Editor {
    store: RecordStore,
    state: EditorState,
    summary: Vec<CorrectionResult>,
    notice: Option<String>,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = Record>) -> Self {
        Self {
            store: RecordStore::from_records(records),
            ..Self::default()
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    /// Corrections from the most recent successful run.
    pub fn summary(&self) -> &[CorrectionResult] {
        &self.summary
    }

    /// Last user-facing rejection or failure message, if any.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Apply an interactive event; on error the state is unchanged.
    pub fn handle(&mut self, event: EditorEvent) -> Result<EditorState, EditorError> {
        let next = match (self.state, &event) {
            (EditorState::Idle | EditorState::EditingRoleAt(_), EditorEvent::BeginRoleEdit(id)) => {
                self.require(*id)?;
                EditorState::EditingRoleAt(*id)
            }
            (EditorState::EditingRoleAt(id), EditorEvent::CommitRole(role)) => {
                self.store.set_role_by_id(id, *role)?;
                EditorState::Idle
            }
            (EditorState::EditingRoleAt(_), EditorEvent::CancelRoleEdit) => EditorState::Idle,
            (EditorState::Idle | EditorState::EditingRoleAt(_), EditorEvent::BeginDrag(id)) => {
                self.require(*id)?;
                EditorState::Dragging(*id)
            }
            (EditorState::Dragging(id), EditorEvent::DropAt(index)) => {
                self.store.move_record(id, *index)?;
                EditorState::Idle
            }
            (EditorState::Dragging(_), EditorEvent::CancelDrag) => EditorState::Idle,
            (
                EditorState::Idle | EditorState::EditingRoleAt(_) | EditorState::Dragging(_),
                EditorEvent::OpenCorrection,
            ) => EditorState::AwaitingCorrection,
            (EditorState::AwaitingCorrection, EditorEvent::CorrectionFinished) => EditorState::Idle,
            (state, _) => {
                debug!("rejected editor event (state={:?}, event={:?})", state, event);
                return Err(EditorError::InvalidTransition {
                    state,
                    event: event.clone(),
                });
            }
        };
        debug!(
            "editor transition (from={:?}, event={:?}, to={:?})",
            self.state, event, next
        );
        self.state = next;
        Ok(next)
    }

    /// Replace all records from upload bytes.
    ///
    /// A rejected upload leaves the records untouched and sets the notice.
    pub fn load(&mut self, raw: &[u8]) -> Result<usize, EditorError> {
        if self.state == EditorState::AwaitingCorrection {
            return Err(EditorError::CorrectionInProgress);
        }
        match self.store.load(raw) {
            Ok(count) => {
                self.state = EditorState::Idle;
                self.summary.clear();
                self.notice = None;
                Ok(count)
            }
            Err(err) => {
                warn!("rejected record upload: {}", err);
                self.notice = Some(LOAD_REJECTED_MESSAGE.to_string());
                Err(EditorError::Format(err))
            }
        }
    }

    pub fn set_role(&mut self, index: usize, role: Role) -> Result<RecordId, EditorError> {
        Ok(self.store.set_role(index, role)?)
    }

    pub fn set_content(
        &mut self,
        index: usize,
        content: impl Into<String>,
    ) -> Result<RecordId, EditorError> {
        Ok(self.store.set_content(index, content)?)
    }

    pub fn insert_at(&mut self, index: usize, record: Record) -> Result<RecordId, EditorError> {
        Ok(self.store.insert_at(index, record)?)
    }

    /// Add an empty assistant row directly below `anchor`.
    pub fn add_row_after(&mut self, anchor: RecordId) -> Result<RecordId, EditorError> {
        Ok(self.store.insert_after(anchor, Record::blank())?)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Record, EditorError> {
        let (id, record) = self.store.remove_at(index)?;
        self.forget(id);
        Ok(record)
    }

    pub fn remove(&mut self, id: RecordId) -> Result<Record, EditorError> {
        let record = self.store.remove(id)?;
        self.forget(id);
        Ok(record)
    }

    pub fn move_to(&mut self, from: usize, to: usize) -> Result<RecordId, EditorError> {
        Ok(self.store.move_to(from, to)?)
    }

    /// Enter `AwaitingCorrection` and hand back the snapshot to correct.
    pub fn begin_correction(&mut self) -> Result<Vec<Record>, EditorError> {
        if self.state == EditorState::AwaitingCorrection {
            return Err(EditorError::CorrectionInProgress);
        }
        self.handle(EditorEvent::OpenCorrection)?;
        let snapshot = self.store.snapshot();
        info!(
            "correction snapshot taken (records={}, revision={})",
            snapshot.len(),
            self.store.revision()
        );
        Ok(snapshot)
    }

    /// Leave `AwaitingCorrection` with the run outcome.
    ///
    /// A successful run replaces the summary; a failed run keeps the previous
    /// summary and sets the retry notice.
    pub fn finish_correction(
        &mut self,
        outcome: Result<Vec<CorrectionResult>, CorrectionError>,
    ) -> Result<(), EditorError> {
        self.handle(EditorEvent::CorrectionFinished)?;
        match outcome {
            Ok(results) => {
                info!("correction summary updated (corrections={})", results.len());
                self.summary = results;
                self.notice = None;
            }
            Err(err) => {
                warn!("correction run discarded: {}", err);
                self.notice = Some(err.user_message().to_string());
            }
        }
        Ok(())
    }

    fn require(&self, id: RecordId) -> Result<(), StoreError> {
        if self.store.contains(id) {
            Ok(())
        } else {
            Err(StoreError::UnknownRecord(id))
        }
    }

    /// Drop any pending reference to a record that no longer exists.
    fn forget(&mut self, removed: RecordId) {
        match self.state {
            EditorState::EditingRoleAt(id) | EditorState::Dragging(id) if id == removed => {
                debug!(
                    "resetting editor state for removed record (id={}, state={:?})",
                    removed, self.state
                );
                self.state = EditorState::Idle;
            }
            _ => {}
        }
    }
}
