use std::collections::HashMap;

use tracing::debug;

use crate::feed::Entry;

/// entry id -> last observed version marker
pub type SeenMap = HashMap<String, String>;

/// Splits `entries` into the ones that are new or carry a different version
/// than recorded so far, and returns `seen` with every fetched entry
/// upserted. An id repeated within `entries` is compared against its earlier
/// copy. Ids missing from `entries` keep their previous version.
pub fn diff(seen: &SeenMap, entries: Vec<Entry>) -> (Vec<Entry>, SeenMap) {
    let mut updated = seen.clone();
    let mut changed = Vec::new();
    for entry in entries {
        let is_changed = updated.get(&entry.id) != Some(&entry.version);
        updated.insert(entry.id.clone(), entry.version.clone());
        if is_changed {
            changed.push(entry);
        } else {
            debug!(id = %entry.id, "offer already processed with the same status update");
        }
    }
    (changed, updated)
}

/// Per-filter-set detection state. Owned by exactly one watch loop at a
/// time and handed back to the manager when that loop stops.
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    seen: SeenMap,
    empty_notified: bool,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies [`diff`] to the stored map and keeps the updated map.
    /// A non-empty fetch always lifts the empty-result suppression.
    pub fn observe(&mut self, entries: Vec<Entry>) -> Vec<Entry> {
        if !entries.is_empty() {
            self.empty_notified = false;
        }
        let (changed, updated) = diff(&self.seen, entries);
        self.seen = updated;
        changed
    }

    /// Returns true when a "no offers" message should go out now, i.e. the
    /// first empty result since the last reset or the last non-empty one.
    pub fn should_report_empty(&mut self) -> bool {
        if self.empty_notified {
            false
        } else {
            self.empty_notified = true;
            true
        }
    }

    pub fn reset(&mut self) {
        self.seen.clear();
        self.empty_notified = false;
    }

    pub fn seen(&self) -> &SeenMap {
        &self.seen
    }

    pub fn empty_notified(&self) -> bool {
        self.empty_notified
    }

    pub fn is_clean(&self) -> bool {
        self.seen.is_empty() && !self.empty_notified
    }
}
