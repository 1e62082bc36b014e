//! Path → owning-group lookup.

use std::collections::{BTreeSet, HashMap};

use crate::group::TabsGroup;

/// Maps a normalized path to the ids of every group holding a tab for it.
///
/// Entries are never left empty: removing the last group id for a path drops
/// the path key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseIndex {
    entries: HashMap<String, BTreeSet<String>>,
}

impl ReverseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from scratch by scanning every group's tabs.
    pub fn from_groups<'a>(groups: impl IntoIterator<Item = &'a TabsGroup>) -> Self {
        let mut index = Self::new();
        index.rebuild(groups);
        index
    }

    pub fn add(&mut self, path: &str, group_id: &str) {
        self.entries
            .entry(path.to_string())
            .or_default()
            .insert(group_id.to_string());
    }

    pub fn remove(&mut self, path: &str, group_id: &str) {
        if let Some(ids) = self.entries.get_mut(path) {
            ids.remove(group_id);
            if ids.is_empty() {
                self.entries.remove(path);
            }
        }
    }

    /// Drops the whole entry for `path`, returning the ids it held.
    pub fn remove_path(&mut self, path: &str) -> BTreeSet<String> {
        self.entries.remove(path).unwrap_or_default()
    }

    /// Drops `group_id` from every entry that references it.
    pub fn remove_group(&mut self, group_id: &str) {
        self.entries.retain(|_, ids| {
            ids.remove(group_id);
            !ids.is_empty()
        });
    }

    pub fn add_group(&mut self, group: &TabsGroup) {
        for path in group.paths() {
            self.add(&path, group.id());
        }
    }

    pub fn rebuild<'a>(&mut self, groups: impl IntoIterator<Item = &'a TabsGroup>) {
        self.entries.clear();
        for group in groups {
            self.add_group(group);
        }
    }

    pub fn get(&self, path: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(path)
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
