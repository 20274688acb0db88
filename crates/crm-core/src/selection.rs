use std::collections::HashSet;

/// Ids marked for a bulk action (assign, delete, message).
///
/// The set itself is plain; [`crate::list::RecordList`] keeps it clamped to
/// the visible rows by calling [`Selection::retain_visible`] after every
/// filter or store change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: HashSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    // ===== Getters =====

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// True when every visible id is selected (drives the header checkbox)
    pub fn covers<'a>(&self, visible: impl IntoIterator<Item = &'a str>) -> bool {
        let mut any = false;
        for id in visible {
            any = true;
            if !self.ids.contains(id) {
                return false;
            }
        }
        any
    }

    // ===== Mutations =====

    /// Flip membership of one id. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn insert(&mut self, id: &str) {
        self.ids.insert(id.to_string());
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    /// Replace the selection with exactly the given ids
    pub fn select_all<'a>(&mut self, visible: impl IntoIterator<Item = &'a str>) {
        self.ids = visible.into_iter().map(str::to_string).collect();
    }

    /// Drop ids that are no longer visible. Returns how many were dropped.
    pub fn retain_visible<'a>(&mut self, visible: impl IntoIterator<Item = &'a str>) -> usize {
        let visible: HashSet<&str> = visible.into_iter().collect();
        let before = self.ids.len();
        self.ids.retain(|id| visible.contains(id.as_str()));
        before - self.ids.len()
    }
}
