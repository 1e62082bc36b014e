//! The group collection and its mutation engine.
//!
//! Every method runs to completion synchronously and leaves the groups map and
//! the reverse index consistent on return. Missing group ids are tolerated:
//! UI actions can race with deletions, so lookups return `None` and mutations
//! on unknown ids are no-ops that report `false`.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::group::{DEFAULT_GROUP_LABEL, TabsGroup, TabsGroupData};
use crate::reverse_index::ReverseIndex;
use crate::tab_item::{TabItem, normalize_path};

const PINNED_SCORE: u32 = 100;
const NAMED_SCORE: u32 = 10;
const TAGGED_SCORE: u32 = 1;

/// Predicate used by [`TabsState::filter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupFilter {
    Pinned,
    Titled,
    Tagged,
    Tag(String),
    ContainsPath(String),
    LabelContains(String),
}

impl GroupFilter {
    pub fn matches(&self, group: &TabsGroup) -> bool {
        match self {
            GroupFilter::Pinned => group.is_pinned(),
            GroupFilter::Titled => !group.is_untitled(),
            GroupFilter::Tagged => !group.tags().is_empty(),
            GroupFilter::Tag(tag) => group.has_tag(tag),
            GroupFilter::ContainsPath(path) => group.contains_path(&normalize_path(path)),
            GroupFilter::LabelContains(text) => group
                .label()
                .to_lowercase()
                .contains(&text.to_lowercase()),
        }
    }
}

/// Display priority of a group: pinned 100, named 10, tagged 1.
pub fn priority_score(group: &TabsGroup) -> u32 {
    let mut score = 0;
    if group.is_pinned() {
        score += PINNED_SCORE;
    }
    if !group.is_untitled() {
        score += NAMED_SCORE;
    }
    if !group.tags().is_empty() {
        score += TAGGED_SCORE;
    }
    score
}

/// Canonical display order: higher score first, then newest first.
pub fn sort_by_priority(groups: &mut [&TabsGroup]) {
    groups.sort_by(|a, b| {
        priority_score(b)
            .cmp(&priority_score(a))
            .then_with(|| b.create_time().cmp(&a.create_time()))
            .then_with(|| a.id().cmp(b.id()))
    });
}

/// A collection of tab groups plus its reverse index and blacklist.
#[derive(Debug, Clone, Default)]
pub struct TabsState {
    groups: HashMap<String, TabsGroup>,
    index: ReverseIndex,
    blacklist: BTreeSet<String>,
    branch_name: Option<String>,
    untitled_seq: u32,
}

impl TabsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn branch_name(&self) -> Option<&str> {
        self.branch_name.as_deref()
    }

    pub fn set_branch_name(&mut self, branch_name: Option<String>) {
        self.branch_name = branch_name;
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, id: &str) -> Option<&TabsGroup> {
        self.groups.get(id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &TabsGroup> {
        self.groups.values()
    }

    pub fn group_ids(&self) -> impl Iterator<Item = &String> {
        self.groups.keys()
    }

    pub fn index(&self) -> &ReverseIndex {
        &self.index
    }

    /// Whether the incrementally maintained index equals a fresh rebuild.
    pub fn verify_index(&self) -> bool {
        self.index == ReverseIndex::from_groups(self.groups.values())
    }

    pub fn rebuild_index(&mut self) {
        self.index.rebuild(self.groups.values());
    }

    /// Inserts a group and indexes its tabs. Groups without an id are
    /// ignored. A group with an id already present replaces the old one.
    /// Repeated paths are pruned on the way in, first occurrence wins.
    pub fn add_tabs_group(&mut self, mut group: TabsGroup) -> bool {
        if group.id().is_empty() {
            log::debug!("ignoring tabs group without id");
            return false;
        }
        let dropped = group.remove_duplicate_tabs();
        if !dropped.is_empty() {
            log::debug!(
                "dropped {} repeated tab(s) from group {}",
                dropped.len(),
                group.id()
            );
        }
        if self.groups.contains_key(group.id()) {
            self.index.remove_group(group.id());
        }
        self.index.add_group(&group);
        self.groups.insert(group.id().to_string(), group);
        true
    }

    /// Creates and inserts a new group from candidate tabs.
    ///
    /// Without a label the group gets the untitled label suffixed by this
    /// state's creation counter. Blacklisted and repeated paths are dropped.
    pub fn create_group(&mut self, label: Option<String>, tabs: Vec<TabItem>) -> String {
        let label = label.unwrap_or_else(|| self.next_untitled_label());
        let tabs = self.admissible(tabs, &HashSet::new());
        let group = TabsGroup::with_tabs(Some(label), tabs);
        let id = group.id().to_string();
        self.add_tabs_group(group);
        id
    }

    fn next_untitled_label(&mut self) -> String {
        self.untitled_seq += 1;
        format!("{DEFAULT_GROUP_LABEL} {}", self.untitled_seq)
    }

    /// Removes a group regardless of its pin state.
    pub fn remove_tabs_group(&mut self, id: &str) -> Option<TabsGroup> {
        let group = self.groups.remove(id)?;
        self.index.remove_group(id);
        Some(group)
    }

    /// Removes a group only if it is not pinned.
    pub fn try_remove_tabs_group(&mut self, id: &str) -> bool {
        match self.groups.get(id) {
            Some(group) if !group.is_pinned() => self.remove_tabs_group(id).is_some(),
            _ => false,
        }
    }

    /// Removes a group, bypassing the pin guard only when the user confirmed.
    pub fn force_remove_tabs_group(&mut self, id: &str, confirmed: bool) -> bool {
        if confirmed {
            self.remove_tabs_group(id).is_some()
        } else {
            self.try_remove_tabs_group(id)
        }
    }

    fn update_group(&mut self, id: &str, f: impl FnOnce(&mut TabsGroup)) -> bool {
        match self.groups.get_mut(id) {
            Some(group) => {
                f(group);
                true
            }
            None => false,
        }
    }

    pub fn set_pinned(&mut self, id: &str, pinned: bool) -> bool {
        self.update_group(id, |g| g.set_pin(pinned))
    }

    pub fn set_group_label(&mut self, id: &str, label: impl Into<String>) -> bool {
        let label = label.into();
        self.update_group(id, |g| g.set_label(label))
    }

    pub fn set_group_tags(&mut self, id: &str, tags: Vec<String>) -> bool {
        self.update_group(id, |g| g.set_tags(tags))
    }

    pub fn add_tags_to_group(&mut self, id: &str, tags: Vec<String>) -> bool {
        self.update_group(id, |g| g.extend_tags(tags))
    }

    /// Replaces a group's tabs, keeping the index in step. Repeated paths in
    /// `tabs` are pruned, first occurrence wins.
    pub fn set_group_tabs(&mut self, id: &str, tabs: Vec<TabItem>) -> bool {
        let Some(group) = self.groups.get_mut(id) else {
            return false;
        };
        for path in group.paths() {
            self.index.remove(&path, id);
        }
        group.set_tabs(tabs);
        group.remove_duplicate_tabs();
        self.index.add_group(group);
        true
    }

    /// Appends tabs whose path is not already in the group. Existing tabs win;
    /// blacklisted candidates are dropped. Returns how many were appended.
    pub fn add_tabs_to_group(&mut self, id: &str, tabs: Vec<TabItem>) -> usize {
        let Some(group) = self.groups.get(id) else {
            return 0;
        };
        let existing: HashSet<String> = group.paths().into_iter().collect();
        let appended = self.admissible(tabs, &existing);
        let count = appended.len();
        for tab in &appended {
            self.index.add(&tab.path(), id);
        }
        if let Some(group) = self.groups.get_mut(id) {
            group.extend_tabs(appended);
        }
        count
    }

    /// Filters candidates down to non-blacklisted tabs with paths not in
    /// `existing` and not repeated among themselves.
    pub(crate) fn admissible(
        &self,
        tabs: Vec<TabItem>,
        existing: &HashSet<String>,
    ) -> Vec<TabItem> {
        let mut seen = existing.clone();
        tabs.into_iter()
            .filter(|tab| {
                let path = tab.path();
                !self.is_blacklisted(&path) && seen.insert(path)
            })
            .collect()
    }

    /// Removes the tabs for `path` from one group. An emptied group is pruned
    /// unless it is pinned. Returns whether anything was removed.
    pub fn remove_tab_from_group(&mut self, id: &str, path: &str) -> bool {
        let path = normalize_path(path);
        let Some(group) = self.groups.get_mut(id) else {
            return false;
        };
        if group.take_tabs_by_path(&path).is_empty() {
            return false;
        }
        self.index.remove(&path, id);
        self.prune_if_empty(id);
        true
    }

    /// Removes `path` from every group that holds it, pruning emptied
    /// unpinned groups. Returns the ids of the affected groups.
    pub fn remove_tab_from_all_groups(&mut self, path: &str) -> Vec<String> {
        let path = normalize_path(path);
        let ids = self.index.remove_path(&path);
        let mut affected = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(group) = self.groups.get_mut(&id) {
                group.take_tabs_by_path(&path);
                affected.push(id.clone());
                self.prune_if_empty(&id);
            }
        }
        if !affected.is_empty() {
            log::debug!("removed {path} from {} group(s)", affected.len());
        }
        affected
    }

    fn prune_if_empty(&mut self, id: &str) {
        let prune = self
            .groups
            .get(id)
            .is_some_and(|g| g.is_empty() && !g.is_pinned());
        if prune {
            self.remove_tabs_group(id);
        }
    }

    /// Moves the tabs for `path` from `src` to `dst`. If `dst` already holds
    /// the path the moved tab is dropped. An emptied unpinned source is pruned.
    pub fn move_tab(&mut self, src: &str, dst: &str, path: &str) -> bool {
        if src == dst || !self.groups.contains_key(dst) {
            return false;
        }
        let path = normalize_path(path);
        let Some(source) = self.groups.get_mut(src) else {
            return false;
        };
        let mut taken = source.take_tabs_by_path(&path);
        if taken.is_empty() {
            return false;
        }
        self.index.remove(&path, src);
        if let Some(target) = self.groups.get_mut(dst) {
            if !target.contains_path(&path) {
                target.push_tab(taken.swap_remove(0));
            }
        }
        self.index.add(&path, dst);
        self.prune_if_empty(src);
        true
    }

    pub fn reorder_tab(&mut self, id: &str, from: usize, to: usize) -> bool {
        self.groups
            .get_mut(id)
            .is_some_and(|group| group.move_tab(from, to))
    }

    /// Merges every source group into `dst`.
    ///
    /// Source tabs are cloned under fresh ids and appended, the destination
    /// label records the merged labels, and each source is then removed
    /// unless pinned, in which case it stays behind emptied. The destination
    /// ends up with one tab per path, first seen wins.
    pub fn merge_tabs_group(&mut self, dst: &str, sources: &[String]) -> bool {
        if !self.groups.contains_key(dst) {
            return false;
        }
        let mut merged_labels = Vec::new();
        for src in sources {
            if src == dst {
                continue;
            }
            let Some(source) = self.groups.get(src) else {
                continue;
            };
            let clones: Vec<TabItem> = source.tabs().iter().map(TabItem::deep_clone).collect();
            merged_labels.push(source.label().to_string());

            for tab in &clones {
                self.index.add(&tab.path(), dst);
            }
            if let Some(target) = self.groups.get_mut(dst) {
                target.extend_tabs(clones);
            }

            if !self.try_remove_tabs_group(src) {
                self.set_group_tabs(src, Vec::new());
            }
        }

        if let Some(target) = self.groups.get_mut(dst) {
            if !merged_labels.is_empty() {
                let label = format!(
                    "{} (merged with: {})",
                    target.label(),
                    merged_labels.join(", ")
                );
                target.set_label(label);
            }
            target.remove_duplicate_tabs();
        }
        log::debug!("merged {} group(s) into {dst}", merged_labels.len());
        true
    }

    /// All groups in canonical display order.
    pub fn sorted_groups(&self) -> Vec<&TabsGroup> {
        let mut groups: Vec<&TabsGroup> = self.groups.values().collect();
        sort_by_priority(&mut groups);
        groups
    }

    /// Groups matching every filter, in canonical display order.
    pub fn filter(&self, filters: &[GroupFilter]) -> Vec<&TabsGroup> {
        let mut groups: Vec<&TabsGroup> = self
            .groups
            .values()
            .filter(|g| filters.iter().all(|f| f.matches(g)))
            .collect();
        sort_by_priority(&mut groups);
        groups
    }

    pub fn pinned_groups(&self) -> Vec<&TabsGroup> {
        self.filter(&[GroupFilter::Pinned])
    }

    pub fn titled_groups(&self) -> Vec<&TabsGroup> {
        self.filter(&[GroupFilter::Titled])
    }

    pub fn tagged_groups(&self) -> Vec<&TabsGroup> {
        self.filter(&[GroupFilter::Tagged])
    }

    /// Every tag in use, sorted.
    pub fn all_tags(&self) -> BTreeSet<String> {
        self.groups
            .values()
            .flat_map(|g| g.tags().iter().cloned())
            .collect()
    }

    /// Ids of the groups holding a tab for `path`.
    pub fn groups_containing(&self, path: &str) -> Vec<String> {
        self.index
            .get(&normalize_path(path))
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.index.contains_path(&normalize_path(path))
    }

    pub fn blacklist(&self) -> &BTreeSet<String> {
        &self.blacklist
    }

    pub fn add_to_blacklist(&mut self, pattern: impl Into<String>) -> bool {
        self.blacklist.insert(normalize_path(&pattern.into()))
    }

    pub fn remove_from_blacklist(&mut self, pattern: &str) -> bool {
        self.blacklist.remove(&normalize_path(pattern))
    }

    pub fn is_blacklisted(&self, path: &str) -> bool {
        let path = normalize_path(path);
        self.blacklist
            .iter()
            .any(|pattern| matches_pattern(pattern, &path))
    }

    /// Copies the whole state. With `preserve_ids` the groups and tabs keep
    /// their ids, which is only meant for parking the active state under a
    /// branch; otherwise every group and tab gets a fresh id.
    pub fn deep_clone(&self, preserve_ids: bool) -> Self {
        let groups: HashMap<String, TabsGroup> = self
            .groups
            .values()
            .map(|group| {
                let clone = if preserve_ids {
                    group.clone()
                } else {
                    group.deep_clone()
                };
                (clone.id().to_string(), clone)
            })
            .collect();
        let index = ReverseIndex::from_groups(groups.values());
        Self {
            groups,
            index,
            blacklist: self.blacklist.clone(),
            branch_name: self.branch_name.clone(),
            untitled_seq: self.untitled_seq,
        }
    }

    pub fn to_transfer(&self) -> TabsStateData {
        TabsStateData {
            groups: self
                .groups
                .iter()
                .map(|(id, group)| (id.clone(), group.to_transfer()))
                .collect(),
            black_list: self.blacklist.iter().cloned().collect(),
            branch_name: self.branch_name.clone(),
        }
    }

    /// Rebuilds a state from its persisted form; the reverse index is always
    /// derived from the groups.
    pub fn from_transfer(data: TabsStateData) -> Self {
        let mut state = Self {
            branch_name: data.branch_name,
            ..Self::default()
        };
        for (key, mut group) in data.groups {
            if group.id.is_empty() {
                group.id = key;
            }
            state.add_tabs_group(TabsGroup::from_transfer(group));
        }
        for pattern in data.black_list {
            state.add_to_blacklist(pattern);
        }
        state.untitled_seq = state
            .groups
            .values()
            .filter_map(|g| untitled_number(g.label()))
            .max()
            .unwrap_or(0);
        state
    }

    pub fn to_json(&self) -> ModelResult<String> {
        serde_json::to_string_pretty(&self.to_transfer())
            .map_err(|e| ModelError::Serialize(e.to_string()))
    }

    pub fn from_json(json: &str) -> ModelResult<Self> {
        let data: TabsStateData = serde_json::from_str(json)?;
        Ok(Self::from_transfer(data))
    }

    /// Parses persisted data, substituting an empty state when it cannot be
    /// read at all.
    pub fn from_json_or_default(json: &str) -> Self {
        Self::from_json(json).unwrap_or_else(|e| {
            log::warn!("discarding unreadable tabs state: {e}");
            Self::default()
        })
    }

    /// Ids of groups ordered by creation time, newest first. Used by access
    /// based sorting as a stable fallback.
    pub(crate) fn ids_by_recency(&self) -> Vec<&str> {
        let mut groups: Vec<&TabsGroup> = self.groups.values().collect();
        groups.sort_by_key(|g| (Reverse(g.create_time()), g.id().to_string()));
        groups.into_iter().map(TabsGroup::id).collect()
    }
}

/// Persisted form of a [`TabsState`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabsStateData {
    #[serde(default)]
    pub groups: BTreeMap<String, TabsGroupData>,
    #[serde(default)]
    pub black_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
}

/// Number suffix of a generated untitled label, e.g. 3 for
/// "Untitled tabs group 3".
fn untitled_number(label: &str) -> Option<u32> {
    label
        .strip_prefix(DEFAULT_GROUP_LABEL)?
        .trim_start()
        .parse()
        .ok()
}

/// Matches a path against a blacklist entry. `*` matches any run of
/// characters; an entry without `*` must equal the path.
fn matches_pattern(pattern: &str, path: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == path;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    let Some((first, rest)) = parts.split_first() else {
        return false;
    };
    let Some((last, middle)) = rest.split_last() else {
        return false;
    };
    let Some(mut remaining) = path.strip_prefix(first) else {
        return false;
    };
    for part in middle {
        match remaining.find(part) {
            Some(pos) => remaining = &remaining[pos + part.len()..],
            None => return false,
        }
    }
    remaining.ends_with(last)
}
