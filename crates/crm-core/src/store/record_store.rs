use std::collections::HashSet;

use tracing::{info, warn};

use super::ids::IdAllocator;
use crate::error::{CrmError, Result};
use crate::models::{Assignable, HasStatus, Record};
use crate::search::digits_only;

/// In-memory, ordered collection of one record kind.
///
/// Ids are unique within a store. Every mutation keeps store order for the
/// records it does not touch.
#[derive(Debug, Clone)]
pub struct RecordStore<R: Record> {
    records: Vec<R>,
    ids: IdAllocator,
}

impl<R: Record> Default for RecordStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> RecordStore<R> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            ids: IdAllocator::default(),
        }
    }

    /// Build a store from a loaded payload.
    ///
    /// Later records reusing an earlier id are dropped; records without an
    /// id get one from the allocator.
    pub fn from_records(records: Vec<R>) -> Self {
        let mut ids = IdAllocator::sequence_after(records.iter().map(|r| r.id()));
        let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
        let mut kept = Vec::with_capacity(records.len());
        let mut missing_id = Vec::new();

        for record in records {
            if record.id().trim().is_empty() {
                missing_id.push(record);
                continue;
            }
            if !seen.insert(record.id().to_string()) {
                warn!(kind = %R::KIND, id = record.id(), "dropping record with duplicate id");
                continue;
            }
            kept.push(record);
        }

        for mut record in missing_id {
            let id = ids.next_id(|candidate| seen.contains(candidate));
            seen.insert(id.clone());
            record.set_id(id);
            kept.push(record);
        }

        Self { records: kept, ids }
    }

    /// Use UUIDs (or another allocator) for records created from now on
    pub fn with_allocator(mut self, ids: IdAllocator) -> Self {
        self.ids = ids;
        self
    }

    pub fn into_records(self) -> Vec<R> {
        self.records
    }

    // ===== Getters =====

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id())
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    // ===== Mutations =====

    /// Validate a submitted form and append it under a freshly allocated id.
    pub fn add(&mut self, mut record: R) -> Result<&R> {
        record.validate().map_err(CrmError::Validation)?;

        let records = &self.records;
        let id = self
            .ids
            .next_id(|candidate| records.iter().any(|r| r.id() == candidate));
        record.set_id(id);
        info!(kind = %R::KIND, id = record.id(), "record added");

        self.records.push(record);
        let last = self.records.len() - 1;
        Ok(&self.records[last])
    }

    /// Insert or replace a record whose id was issued elsewhere (e.g. the server).
    pub fn upsert(&mut self, record: R) -> Result<()> {
        let mut errors = record.validate().err().unwrap_or_default();
        errors.require("id", record.id());
        errors.into_result().map_err(CrmError::Validation)?;
        self.ids.observe(record.id());

        match self.position(record.id()) {
            Some(idx) => self.records[idx] = record,
            None => self.records.push(record),
        }
        Ok(())
    }

    /// Edit-form submission: replace the stored record with the same id.
    pub fn replace(&mut self, record: R) -> Result<()> {
        let idx = self
            .position(record.id())
            .ok_or_else(|| CrmError::not_found(record.id()))?;
        record.validate().map_err(CrmError::Validation)?;
        info!(kind = %R::KIND, id = record.id(), "record updated");
        self.records[idx] = record;
        Ok(())
    }

    /// Apply `edit` to a copy, validate it, then swap it in. The id cannot be changed.
    pub fn update(&mut self, id: &str, edit: impl FnOnce(&mut R)) -> Result<&R> {
        let idx = self.position(id).ok_or_else(|| CrmError::not_found(id))?;

        let mut updated = self.records[idx].clone();
        edit(&mut updated);
        updated.set_id(id.to_string());
        updated.validate().map_err(CrmError::Validation)?;

        self.records[idx] = updated;
        info!(kind = %R::KIND, id, "record updated");
        Ok(&self.records[idx])
    }

    pub fn remove(&mut self, id: &str) -> Result<R> {
        let idx = self.position(id).ok_or_else(|| CrmError::not_found(id))?;
        info!(kind = %R::KIND, id, "record deleted");
        Ok(self.records.remove(idx))
    }

    /// Remove every record whose id is in `ids`; unknown ids are ignored.
    /// Returns the removed records in store order.
    pub fn remove_many<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) -> Vec<R> {
        let ids: HashSet<&str> = ids.into_iter().collect();
        let (removed, kept): (Vec<R>, Vec<R>) = std::mem::take(&mut self.records)
            .into_iter()
            .partition(|r| ids.contains(r.id()));
        self.records = kept;
        if !removed.is_empty() {
            info!(kind = %R::KIND, count = removed.len(), "records deleted");
        }
        removed
    }

    /// Remove later records whose phone number (digits only) repeats an
    /// earlier one. Records without a phone are never considered duplicates.
    pub fn dedupe_by_phone(&mut self) -> Vec<R> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.records.len());

        for record in std::mem::take(&mut self.records) {
            let key = record.phone().map(digits_only).unwrap_or_default();
            if key.is_empty() || seen.insert(key) {
                kept.push(record);
            } else {
                removed.push(record);
            }
        }

        self.records = kept;
        if !removed.is_empty() {
            info!(kind = %R::KIND, count = removed.len(), "duplicate phone numbers removed");
        }
        removed
    }
}

impl<R: Assignable> RecordStore<R> {
    /// Assign every listed record to `agent_id`. Returns how many were updated.
    pub fn assign<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>, agent_id: &str) -> usize {
        let ids: HashSet<&str> = ids.into_iter().collect();
        let mut count = 0;
        for record in self.records.iter_mut().filter(|r| ids.contains(r.id())) {
            record.assign_to(agent_id);
            count += 1;
        }
        info!(kind = %R::KIND, agent_id, count, "records assigned");
        count
    }
}

impl<R: HasStatus> RecordStore<R> {
    /// Set the status of every listed record. Returns how many changed.
    pub fn set_status<'a>(
        &mut self,
        ids: impl IntoIterator<Item = &'a str>,
        status: R::Status,
    ) -> usize {
        let ids: HashSet<&str> = ids.into_iter().collect();
        let mut count = 0;
        for record in self.records.iter_mut().filter(|r| ids.contains(r.id())) {
            if record.status() != status {
                record.set_status(status);
                count += 1;
            }
        }
        info!(kind = %R::KIND, %status, count, "status changed");
        count
    }
}
