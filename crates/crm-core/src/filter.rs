//! Filter predicate set shared by every record screen.
//!
//! A [`FilterState`] holds the raw inputs of a screen's filter bar. It
//! compiles to a list of active [`Predicate`]s; a record is visible iff it
//! satisfies all of them. Output always preserves store order.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Days, NaiveDate, NaiveDateTime};
use tracing::trace;

use crate::constants::ALL_SENTINEL;
use crate::models::{parse_timestamp, Record};
use crate::search::{fields_contain_all_terms, parse_search_terms};

/// One compiled match criterion.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Every term appears (case-insensitively) in one of the record's search fields
    Text { terms: Vec<String> },
    /// Named category field equals `value` exactly
    Category { field: String, value: String },
    /// Timestamp within `[from, until)`. A missing or unparseable timestamp never matches.
    DateRange {
        from: Option<NaiveDateTime>,
        until: Option<NaiveDateTime>,
    },
    /// Record is assigned to one of these users (role scoping)
    AssignedTo { user_ids: BTreeSet<String> },
}

impl Predicate {
    pub fn matches<R: Record>(&self, record: &R) -> bool {
        match self {
            Predicate::Text { terms } => fields_contain_all_terms(&record.search_fields(), terms),
            Predicate::Category { field, value } => {
                record.category(field).map_or(false, |v| v == value.as_str())
            }
            Predicate::DateRange { from, until } => {
                let Some(ts) = record.timestamp().and_then(parse_timestamp) else {
                    return false;
                };
                from.map_or(true, |from| ts >= from) && until.map_or(true, |until| ts < until)
            }
            Predicate::AssignedTo { user_ids } => record
                .assignee()
                .map_or(false, |assignee| user_ids.contains(assignee)),
        }
    }
}

/// Raw filter inputs. Every field is either empty (no-op) or a criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    /// field -> selected value; the `"all"` sentinel is never stored
    categories: BTreeMap<String, String>,
    pub date_from: Option<NaiveDate>,
    /// Inclusive: the whole `date_to` day matches
    pub date_to: Option<NaiveDate>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_category(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_category(field, value);
        self
    }

    pub fn with_date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    /// Select a category value. Empty or `"all"` clears the field.
    pub fn set_category(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        if value.trim().is_empty() || value.eq_ignore_ascii_case(ALL_SENTINEL) {
            self.categories.remove(&field);
        } else {
            self.categories.insert(field, value);
        }
    }

    pub fn category(&self, field: &str) -> Option<&str> {
        self.categories.get(field).map(String::as_str)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &str)> {
        self.categories
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty()
            && self.categories.is_empty()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }

    /// Compile to the active predicates only.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();

        let terms = parse_search_terms(&self.search);
        if !terms.is_empty() {
            predicates.push(Predicate::Text { terms });
        }

        for (field, value) in &self.categories {
            predicates.push(Predicate::Category {
                field: field.clone(),
                value: value.clone(),
            });
        }

        if self.date_from.is_some() || self.date_to.is_some() {
            predicates.push(Predicate::DateRange {
                from: self.date_from.and_then(|d| d.and_hms_opt(0, 0, 0)),
                until: self
                    .date_to
                    .and_then(|d| d.checked_add_days(Days::new(1)))
                    .and_then(|d| d.and_hms_opt(0, 0, 0)),
            });
        }

        predicates
    }

    pub fn matches<R: Record>(&self, record: &R) -> bool {
        self.predicates().iter().all(|p| p.matches(record))
    }

    /// Records satisfying every active predicate, in store order.
    pub fn apply<'a, R: Record>(&self, records: &'a [R]) -> Vec<&'a R> {
        apply_predicates(&self.predicates(), records)
    }
}

/// AND-combine `predicates` over `records`, preserving order.
pub fn apply_predicates<'a, R: Record>(predicates: &[Predicate], records: &'a [R]) -> Vec<&'a R> {
    let visible: Vec<&R> = records
        .iter()
        .filter(|r| predicates.iter().all(|p| p.matches(*r)))
        .collect();
    trace!(
        kind = %R::KIND,
        predicates = predicates.len(),
        total = records.len(),
        visible = visible.len(),
        "applied filter"
    );
    visible
}
