//! Tab groups.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tab_item::{TabItem, TabItemData};

/// Label assigned to groups the user has not named yet.
pub const DEFAULT_GROUP_LABEL: &str = "Untitled tabs group";

/// An ordered collection of saved tabs plus group metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabsGroup {
    id: String,
    label: String,
    pinned: bool,
    tags: Vec<String>,
    create_time: i64,
    tabs: Vec<TabItem>,
}

impl TabsGroup {
    /// Creates an empty group. A fresh id is generated when `id` is `None`,
    /// and the default untitled label is used when `label` is `None`.
    pub fn new(id: Option<String>, label: Option<String>) -> Self {
        Self {
            id: id.unwrap_or_else(new_group_id),
            label: label.unwrap_or_else(|| DEFAULT_GROUP_LABEL.to_string()),
            pinned: false,
            tags: Vec::new(),
            create_time: now_millis(),
            tabs: Vec::new(),
        }
    }

    pub fn with_tabs(label: Option<String>, tabs: Vec<TabItem>) -> Self {
        let mut group = Self::new(None, label);
        group.set_tabs(tabs);
        group
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn set_pin(&mut self, pinned: bool) {
        self.pinned = pinned;
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Replaces the tag list, dropping repeated tags while keeping the first
    /// position of each.
    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.tags.clear();
        self.extend_tags(tags);
    }

    pub fn extend_tags(&mut self, tags: impl IntoIterator<Item = String>) {
        for tag in tags {
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn create_time(&self) -> i64 {
        self.create_time
    }

    pub fn set_create_time(&mut self, millis: i64) {
        self.create_time = millis;
    }

    /// Whether the label still carries the system default. Matching is
    /// substring-contains, so "Untitled tabs group 3" is untitled too.
    pub fn is_untitled(&self) -> bool {
        self.label.contains(DEFAULT_GROUP_LABEL)
    }

    pub fn tabs(&self) -> &[TabItem] {
        &self.tabs
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn set_tabs(&mut self, tabs: Vec<TabItem>) {
        self.tabs = tabs;
        let id = self.id.clone();
        for tab in &mut self.tabs {
            tab.set_group_id(&id);
        }
    }

    pub fn push_tab(&mut self, mut tab: TabItem) {
        tab.set_group_id(&self.id);
        self.tabs.push(tab);
    }

    pub fn extend_tabs(&mut self, tabs: impl IntoIterator<Item = TabItem>) {
        for tab in tabs {
            self.push_tab(tab);
        }
    }

    /// Distinct normalized paths of the contained tabs, in list order.
    pub fn paths(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tabs
            .iter()
            .map(TabItem::path)
            .filter(|p| seen.insert(p.clone()))
            .collect()
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.tabs.iter().any(|t| t.path() == path)
    }

    /// Removes every tab whose path matches and returns them in list order.
    pub(crate) fn take_tabs_by_path(&mut self, path: &str) -> Vec<TabItem> {
        let (taken, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.tabs).into_iter().partition(|t| t.path() == path);
        self.tabs = kept;
        taken
    }

    /// Moves the tab at `from` to position `to`. Out-of-range indices are ignored.
    pub fn move_tab(&mut self, from: usize, to: usize) -> bool {
        if from >= self.tabs.len() || to >= self.tabs.len() {
            return false;
        }
        let tab = self.tabs.remove(from);
        self.tabs.insert(to, tab);
        true
    }

    /// Keeps the first tab for each distinct path and drops the later ones.
    /// Returns the dropped tabs.
    pub fn remove_duplicate_tabs(&mut self) -> Vec<TabItem> {
        let mut seen = HashSet::new();
        let mut dropped = Vec::new();
        let tabs = std::mem::take(&mut self.tabs);
        for tab in tabs {
            if seen.insert(tab.path()) {
                self.tabs.push(tab);
            } else {
                dropped.push(tab);
            }
        }
        dropped
    }

    /// Copies the group under a fresh id with every tab cloned and re-owned.
    pub fn deep_clone(&self) -> Self {
        self.clone_with_id(new_group_id())
    }

    pub(crate) fn clone_with_id(&self, id: String) -> Self {
        let mut group = Self {
            id,
            label: self.label.clone(),
            pinned: self.pinned,
            tags: self.tags.clone(),
            create_time: self.create_time,
            tabs: Vec::with_capacity(self.tabs.len()),
        };
        group.extend_tabs(self.tabs.iter().map(TabItem::deep_clone));
        group
    }

    pub fn to_transfer(&self) -> TabsGroupData {
        TabsGroupData {
            id: self.id.clone(),
            label: self.label.clone(),
            pinned: self.pinned,
            tags: self.tags.clone(),
            create_time: self.create_time,
            tabs: self.tabs.iter().map(TabItem::to_transfer).collect(),
        }
    }

    /// Rebuilds a group from its persisted form. Never touches the untitled
    /// counter kept by the owning state.
    pub fn from_transfer(data: TabsGroupData) -> Self {
        let id = if data.id.is_empty() {
            new_group_id()
        } else {
            data.id
        };
        let mut group = Self {
            id,
            label: data.label,
            pinned: data.pinned,
            tags: Vec::new(),
            create_time: data.create_time,
            tabs: Vec::new(),
        };
        group.set_tags(data.tags);
        group.set_tabs(data.tabs.into_iter().map(TabItem::from_transfer).collect());
        group
    }
}

/// Persisted form of a [`TabsGroup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabsGroupData {
    #[serde(default)]
    pub id: String,
    #[serde(default = "default_group_label")]
    pub label: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub create_time: i64,
    #[serde(default)]
    pub tabs: Vec<TabItemData>,
}

fn default_group_label() -> String {
    DEFAULT_GROUP_LABEL.to_string()
}

fn new_group_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
