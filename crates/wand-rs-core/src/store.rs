//! Ordered record collection with stable ids.
//!
//! Records live in an arena keyed by `RecordId`; display order is a separate
//! list of ids. Positional indices are derived from that list, so they are
//! always contiguous `0..len` and never go stale inside the store itself.

use crate::error::{FormatError, StoreError};
use crate::format::parse_records;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use wand_rs_protocol::{Record, Role};

/// Stable identity of a record for the lifetime of its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    entries: HashMap<RecordId, Record>,
    order: Vec<RecordId>,
    /// Ids are never reused, even across `replace_all`.
    next_id: u64,
    revision: u64,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut store = Self::new();
        store.replace_all(records);
        store
    }

    /// Replace the whole collection with parsed upload bytes.
    ///
    /// On a format error the store is left exactly as it was.
    pub fn load(&mut self, raw: &[u8]) -> Result<usize, FormatError> {
        let records = parse_records(raw)?;
        self.replace_all(records);
        info!(
            "loaded records into store (count={}, revision={})",
            self.len(),
            self.revision
        );
        Ok(self.len())
    }

    pub fn replace_all(&mut self, records: impl IntoIterator<Item = Record>) {
        self.entries.clear();
        self.order.clear();
        for record in records {
            let id = self.allocate(record);
            self.order.push(id);
        }
        self.bump();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Incremented by every successful mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn id_at(&self, index: usize) -> Result<RecordId, StoreError> {
        self.order
            .get(index)
            .copied()
            .ok_or(StoreError::IndexOutOfRange {
                index,
                len: self.len(),
            })
    }

    pub fn index_of(&self, id: RecordId) -> Result<usize, StoreError> {
        self.order
            .iter()
            .position(|candidate| *candidate == id)
            .ok_or(StoreError::UnknownRecord(id))
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.entries.get(&id)
    }

    pub fn at(&self, index: usize) -> Result<&Record, StoreError> {
        let id = self.id_at(index)?;
        self.entries.get(&id).ok_or(StoreError::UnknownRecord(id))
    }

    /// Records in display order with their derived index and stable id.
    pub fn records(&self) -> impl Iterator<Item = (usize, RecordId, &Record)> + '_ {
        self.order
            .iter()
            .enumerate()
            .filter_map(|(index, id)| self.entries.get(id).map(|record| (index, *id, record)))
    }

    /// Owned copy of the current sequence, detached from later edits.
    pub fn snapshot(&self) -> Vec<Record> {
        self.records().map(|(_, _, record)| record.clone()).collect()
    }

    pub fn set_role(&mut self, index: usize, role: Role) -> Result<RecordId, StoreError> {
        let id = self.id_at(index)?;
        self.set_role_by_id(id, role)?;
        Ok(id)
    }

    pub fn set_role_by_id(&mut self, id: RecordId, role: Role) -> Result<(), StoreError> {
        let record = self.record_mut(id)?;
        record.role = role;
        debug!("set record role (id={}, role={})", id, role);
        self.bump();
        Ok(())
    }

    pub fn set_content(
        &mut self,
        index: usize,
        content: impl Into<String>,
    ) -> Result<RecordId, StoreError> {
        let id = self.id_at(index)?;
        self.set_content_by_id(id, content)?;
        Ok(id)
    }

    pub fn set_content_by_id(
        &mut self,
        id: RecordId,
        content: impl Into<String>,
    ) -> Result<(), StoreError> {
        let record = self.record_mut(id)?;
        record.content = content.into();
        debug!(
            "set record content (id={}, content_len={})",
            id,
            record.content.len()
        );
        self.bump();
        Ok(())
    }

    /// Insert before the record currently at `index`; `index == len` appends.
    pub fn insert_at(&mut self, index: usize, record: Record) -> Result<RecordId, StoreError> {
        if index > self.len() {
            return Err(StoreError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        let id = self.allocate(record);
        self.order.insert(index, id);
        debug!("inserted record (id={}, index={})", id, index);
        self.bump();
        Ok(id)
    }

    /// Insert directly below an existing record.
    pub fn insert_after(&mut self, anchor: RecordId, record: Record) -> Result<RecordId, StoreError> {
        let index = self.index_of(anchor)?;
        self.insert_at(index + 1, record)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<(RecordId, Record), StoreError> {
        let id = self.id_at(index)?;
        let record = self.remove(id)?;
        Ok((id, record))
    }

    pub fn remove(&mut self, id: RecordId) -> Result<Record, StoreError> {
        let index = self.index_of(id)?;
        let record = self
            .entries
            .remove(&id)
            .ok_or(StoreError::UnknownRecord(id))?;
        self.order.remove(index);
        debug!("removed record (id={}, index={})", id, index);
        self.bump();
        Ok(record)
    }

    /// Move the record at `from` so that it ends up at index `to`.
    ///
    /// `to` is an index into the collection *after* the record has been taken
    /// out (remove-then-insert), so both `from` and `to` must be `< len`.
    /// `move_to(i, j)` followed by `move_to(j, i)` restores the order.
    pub fn move_to(&mut self, from: usize, to: usize) -> Result<RecordId, StoreError> {
        let id = self.id_at(from)?;
        self.move_record(id, to)?;
        Ok(id)
    }

    /// Id-based form of [`RecordStore::move_to`]; returns the new index.
    pub fn move_record(&mut self, id: RecordId, to: usize) -> Result<usize, StoreError> {
        let from = self.index_of(id)?;
        if to >= self.len() {
            return Err(StoreError::IndexOutOfRange {
                index: to,
                len: self.len(),
            });
        }
        self.order.remove(from);
        self.order.insert(to, id);
        debug!("moved record (id={}, from={}, to={})", id, from, to);
        self.bump();
        Ok(to)
    }

    fn allocate(&mut self, record: Record) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, record);
        id
    }

    fn record_mut(&mut self, id: RecordId) -> Result<&mut Record, StoreError> {
        self.entries
            .get_mut(&id)
            .ok_or(StoreError::UnknownRecord(id))
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}
