//! Per-group access tracking for recency and frequency ordering.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::group::{TabsGroup, now_millis};
use crate::state::{TabsState, priority_score};

/// How group listings are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Priority,
    Recency,
    Frequency,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRecord {
    pub last_access: i64,
    pub access_count: u64,
}

/// Group id → access record. Records for deleted groups are harmless and can
/// be dropped with [`AccessTracker::prune_orphans`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTracker {
    #[serde(default)]
    records: HashMap<String, AccessRecord>,
}

impl AccessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch(&mut self, group_id: &str) {
        self.touch_at(group_id, now_millis());
    }

    pub fn touch_at(&mut self, group_id: &str, millis: i64) {
        let record = self.records.entry(group_id.to_string()).or_default();
        record.last_access = record.last_access.max(millis);
        record.access_count += 1;
    }

    pub fn record(&self, group_id: &str) -> Option<AccessRecord> {
        self.records.get(group_id).copied()
    }

    pub fn forget(&mut self, group_id: &str) -> bool {
        self.records.remove(group_id).is_some()
    }

    /// Drops records whose group no longer exists. Returns how many went.
    pub fn prune_orphans(&mut self, state: &TabsState) -> usize {
        let before = self.records.len();
        self.records.retain(|id, _| state.group(id).is_some());
        before - self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Groups of `state` ordered by `mode`. Priority mode is the canonical
    /// order; the access-based modes fall back to it for untouched groups.
    pub fn sorted_groups<'a>(&self, state: &'a TabsState, mode: SortMode) -> Vec<&'a TabsGroup> {
        if mode == SortMode::Priority {
            return state.sorted_groups();
        }
        let mut groups: Vec<&TabsGroup> = state
            .ids_by_recency()
            .into_iter()
            .filter_map(|id| state.group(id))
            .collect();
        groups.sort_by(|a, b| {
            let ra = self.record(a.id()).unwrap_or_default();
            let rb = self.record(b.id()).unwrap_or_default();
            let primary = match mode {
                SortMode::Recency => rb.last_access.cmp(&ra.last_access),
                _ => rb
                    .access_count
                    .cmp(&ra.access_count)
                    .then_with(|| rb.last_access.cmp(&ra.last_access)),
            };
            primary.then_with(|| priority_score(b).cmp(&priority_score(a)))
        });
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tab_item::TabItem;

    fn state_with_three() -> (TabsState, Vec<String>) {
        let mut state = TabsState::new();
        let ids = ["One", "Two", "Three"]
            .iter()
            .map(|label| {
                state.create_group(
                    Some(label.to_string()),
                    vec![TabItem::new(format!("/{label}"), None, None)],
                )
            })
            .collect();
        (state, ids)
    }

    fn labels<'a>(groups: &[&'a TabsGroup]) -> Vec<&'a str> {
        groups.iter().map(|g| g.label()).collect()
    }

    #[test]
    fn touch_counts_and_keeps_latest() {
        let mut tracker = AccessTracker::new();
        tracker.touch_at("g", 50);
        tracker.touch_at("g", 20);
        let record = tracker.record("g").unwrap();
        assert_eq!(record.access_count, 2);
        assert_eq!(record.last_access, 50);
    }

    #[test]
    fn recency_orders_by_last_access() {
        let (state, ids) = state_with_three();
        let mut tracker = AccessTracker::new();
        tracker.touch_at(&ids[0], 300);
        tracker.touch_at(&ids[2], 100);
        let sorted = tracker.sorted_groups(&state, SortMode::Recency);
        assert_eq!(labels(&sorted), vec!["One", "Three", "Two"]);
    }

    #[test]
    fn frequency_orders_by_count() {
        let (state, ids) = state_with_three();
        let mut tracker = AccessTracker::new();
        tracker.touch_at(&ids[1], 10);
        tracker.touch_at(&ids[1], 11);
        tracker.touch_at(&ids[2], 500);
        let sorted = tracker.sorted_groups(&state, SortMode::Frequency);
        assert_eq!(labels(&sorted)[..2], ["Two", "Three"]);
    }

    #[test]
    fn prune_drops_deleted_groups() {
        let (mut state, ids) = state_with_three();
        let mut tracker = AccessTracker::new();
        for id in &ids {
            tracker.touch(id);
        }
        state.remove_tabs_group(&ids[0]);
        assert_eq!(tracker.prune_orphans(&state), 1);
        assert!(tracker.record(&ids[0]).is_none());
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn sort_mode_parses_lowercase() {
        let mode: SortMode = serde_json::from_str("\"recency\"").unwrap();
        assert_eq!(mode, SortMode::Recency);
    }
}
