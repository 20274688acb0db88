//! The filterable record list every management screen is built on.
//!
//! `RecordList` owns one [`RecordStore`], the screen's [`FilterState`], an
//! optional role scope and the bulk [`Selection`]. The selection is kept a
//! subset of the visible rows: any change to the filter, scope or store
//! drops selected ids that are no longer visible.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{CrmError, Result};
use crate::filter::{apply_predicates, FilterState, Predicate};
use crate::models::{Action, Assignable, HasStatus, Record, RecordKind};
use crate::selection::Selection;
use crate::session::SessionContext;
use crate::store::{Directory, RecordStore};

pub struct RecordList<R: Record> {
    store: RecordStore<R>,
    filter: FilterState,
    scope: Option<Predicate>,
    selection: Selection,
    session: SessionContext,
}

impl<R: Record> RecordList<R> {
    pub fn new(store: RecordStore<R>, session: SessionContext) -> Self {
        Self {
            store,
            filter: FilterState::default(),
            scope: None,
            selection: Selection::default(),
            session,
        }
    }

    /// Narrow the list to the records the signed-in user may see
    /// (own records for agents, team records for supervisors).
    pub fn scoped(mut self, directory: &Directory) -> Self {
        let scope = match self.session.current() {
            Some(session) if R::KIND != RecordKind::User => directory
                .visible_assignees(&session)
                .map(|user_ids| Predicate::AssignedTo { user_ids }),
            _ => None,
        };
        self.set_scope(scope);
        self
    }

    pub fn set_scope(&mut self, scope: Option<Predicate>) {
        self.scope = scope;
        self.reconcile_selection();
    }

    pub fn store(&self) -> &RecordStore<R> {
        &self.store
    }

    pub fn into_store(self) -> RecordStore<R> {
        self.store
    }

    // ===== Filter =====

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
        self.reconcile_selection();
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filter.search = search.into();
        self.reconcile_selection();
    }

    pub fn set_category(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.filter.set_category(field, value);
        self.reconcile_selection();
    }

    pub fn set_date_range(&mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) {
        self.filter.date_from = from;
        self.filter.date_to = to;
        self.reconcile_selection();
    }

    pub fn clear_filters(&mut self) {
        self.filter.clear();
        self.reconcile_selection();
    }

    fn active_predicates(&self) -> Vec<Predicate> {
        let mut predicates = self.filter.predicates();
        if let Some(scope) = &self.scope {
            predicates.push(scope.clone());
        }
        predicates
    }

    /// Rows currently shown, in store order
    pub fn visible(&self) -> Vec<&R> {
        apply_predicates(&self.active_predicates(), self.store.records())
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.store
            .get(id)
            .map_or(false, |r| self.active_predicates().iter().all(|p| p.matches(r)))
    }

    // ===== Selection =====

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Toggle a visible row. Hidden or unknown ids are ignored (returns false).
    pub fn toggle(&mut self, id: &str) -> bool {
        if !self.is_visible(id) {
            debug!(kind = %R::KIND, id, "ignoring toggle of hidden row");
            return false;
        }
        self.selection.toggle(id)
    }

    /// Select every visible row; returns how many are selected
    pub fn select_all_visible(&mut self) -> usize {
        let ids: Vec<String> = self.visible().iter().map(|r| r.id().to_string()).collect();
        self.selection.select_all(ids.iter().map(String::as_str));
        self.selection.len()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Selected rows, in store order
    pub fn selected(&self) -> Vec<&R> {
        self.visible()
            .into_iter()
            .filter(|r| self.selection.contains(r.id()))
            .collect()
    }

    pub fn all_visible_selected(&self) -> bool {
        let visible = self.visible();
        self.selection.covers(visible.iter().map(|r| r.id()))
    }

    fn selected_ids(&self) -> Vec<String> {
        self.selected().iter().map(|r| r.id().to_string()).collect()
    }

    fn reconcile_selection(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        let visible: Vec<String> = self.visible().iter().map(|r| r.id().to_string()).collect();
        let dropped = self
            .selection
            .retain_visible(visible.iter().map(String::as_str));
        if dropped > 0 {
            debug!(kind = %R::KIND, dropped, "deselected rows hidden by filter");
        }
    }

    // ===== Mutations =====

    /// User accounts are governed by `ManageUsers` whatever the action
    fn authorize(&self, action: Action) -> Result<()> {
        let action = if R::KIND == RecordKind::User {
            Action::ManageUsers
        } else {
            action
        };
        self.session.require_action(action)?;
        Ok(())
    }

    fn in_scope(&self, record: &R) -> bool {
        self.scope.as_ref().map_or(true, |scope| scope.matches(record))
    }

    /// Record `id`, reported missing when it lies outside the role scope
    fn scoped_record(&self, id: &str) -> Result<&R> {
        self.store
            .get(id)
            .filter(|record| self.in_scope(record))
            .ok_or_else(|| CrmError::not_found(id))
    }

    /// Submit a create form. Returns the new record's id.
    pub fn add(&mut self, record: R) -> Result<String> {
        self.authorize(Action::CreateRecord)?;
        let id = self.store.add(record)?.id().to_string();
        self.reconcile_selection();
        Ok(id)
    }

    /// Insert or replace a record whose id came from the server
    pub fn upsert(&mut self, record: R) -> Result<()> {
        self.authorize(Action::CreateRecord)?;
        if self.store.contains(record.id()) {
            self.scoped_record(record.id())?;
        }
        self.store.upsert(record)?;
        self.reconcile_selection();
        Ok(())
    }

    /// Edit one record in scope. Edits that would move it out of the
    /// caller's scope count as reassignment and are refused.
    pub fn update(&mut self, id: &str, edit: impl FnOnce(&mut R)) -> Result<()> {
        self.authorize(Action::EditRecord)?;
        let mut draft = self.scoped_record(id)?.clone();
        edit(&mut draft);
        if !self.in_scope(&draft) {
            let session = self.session.require()?;
            return Err(CrmError::Forbidden {
                role: session.role,
                action: Action::AssignRecords.label(),
            });
        }
        self.store.update(id, move |record| *record = draft)?;
        self.reconcile_selection();
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<R> {
        self.authorize(Action::DeleteRecords)?;
        self.scoped_record(id)?;
        let removed = self.store.remove(id)?;
        self.selection.remove(id);
        Ok(removed)
    }

    /// Delete the selected rows and clear the selection
    pub fn delete_selected(&mut self) -> Result<Vec<R>> {
        self.authorize(Action::DeleteRecords)?;
        let ids = self.selected_ids();
        let removed = self.store.remove_many(ids.iter().map(String::as_str));
        self.selection.clear();
        Ok(removed)
    }

    /// Drop repeated phone numbers, keeping the first occurrence
    pub fn remove_duplicate_phones(&mut self) -> Result<Vec<R>> {
        self.authorize(Action::DeleteRecords)?;
        let removed = self.store.dedupe_by_phone();
        self.reconcile_selection();
        Ok(removed)
    }
}

impl<R: Assignable> RecordList<R> {
    /// Assign the selected rows to `agent_id` and clear the selection
    pub fn assign_selected(&mut self, agent_id: &str) -> Result<usize> {
        self.authorize(Action::AssignRecords)?;
        let ids = self.selected_ids();
        let count = self.store.assign(ids.iter().map(String::as_str), agent_id);
        self.selection.clear();
        Ok(count)
    }
}

impl<R: HasStatus> RecordList<R> {
    pub fn set_status(&mut self, id: &str, status: R::Status) -> Result<()> {
        self.authorize(Action::ChangeStatus)?;
        self.scoped_record(id)?;
        self.store.set_status([id], status);
        self.reconcile_selection();
        Ok(())
    }

    /// Change the status of the selected rows and clear the selection
    pub fn set_status_selected(&mut self, status: R::Status) -> Result<usize> {
        self.authorize(Action::ChangeStatus)?;
        let ids = self.selected_ids();
        let count = self.store.set_status(ids.iter().map(String::as_str), status);
        self.selection.clear();
        Ok(count)
    }
}
