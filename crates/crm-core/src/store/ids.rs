use tracing::warn;
use uuid::Uuid;

/// Hands out record ids for locally created records.
///
/// `Sequence` continues after the largest numeric id seen and never goes
/// backwards, so ids freed by a delete are not reused and an empty store
/// starts at 1. Once the sequence cannot advance past `u64::MAX` the
/// allocator switches to `Uuid`, which is also for stores whose ids come
/// from elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdAllocator {
    Sequence { next: u64 },
    Uuid,
}

impl Default for IdAllocator {
    fn default() -> Self {
        IdAllocator::Sequence { next: 1 }
    }
}

impl IdAllocator {
    /// Sequence starting after the largest numeric id in `existing`.
    /// Non-numeric ids are ignored.
    pub fn sequence_after<'a>(existing: impl IntoIterator<Item = &'a str>) -> Self {
        let max = existing
            .into_iter()
            .filter_map(|id| id.trim().parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        match max.checked_add(1) {
            Some(next) => IdAllocator::Sequence { next },
            None => IdAllocator::Uuid,
        }
    }

    /// Next id not rejected by `is_taken`.
    pub fn next_id(&mut self, is_taken: impl Fn(&str) -> bool) -> String {
        if let IdAllocator::Sequence { next } = self {
            while let Some(after) = next.checked_add(1) {
                let candidate = next.to_string();
                *next = after;
                if !is_taken(&candidate) {
                    return candidate;
                }
            }
            warn!("numeric id sequence exhausted, switching to uuids");
            *self = IdAllocator::Uuid;
        }

        loop {
            let candidate = Uuid::new_v4().to_string();
            if !is_taken(&candidate) {
                return candidate;
            }
        }
    }

    /// Make sure a later `next_id` cannot hand out `id` (server-issued or imported ids)
    pub fn observe(&mut self, id: &str) {
        let mut exhausted = false;
        if let IdAllocator::Sequence { next } = self {
            if let Ok(n) = id.trim().parse::<u64>() {
                if n >= *next {
                    match n.checked_add(1) {
                        Some(after) => *next = after,
                        None => exhausted = true,
                    }
                }
            }
        }
        if exhausted {
            *self = IdAllocator::Uuid;
        }
    }
}
