//! Presentation models for tree views and the CLI listing.

use serde::Serialize;
use tabgroups_model::{TabItem, TabsGroup};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabView {
    pub id: String,
    pub label: String,
    pub path: String,
    pub icon: &'static str,
}

impl TabView {
    pub fn from_tab(tab: &TabItem) -> Self {
        Self {
            id: tab.id().to_string(),
            label: tab.label().to_string(),
            path: tab.path(),
            icon: tab.icon(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupView {
    pub id: String,
    pub label: String,
    pub pinned: bool,
    pub tags: Vec<String>,
    pub tabs: Vec<TabView>,
}

impl GroupView {
    pub fn from_group(group: &TabsGroup) -> Self {
        Self {
            id: group.id().to_string(),
            label: group.label().to_string(),
            pinned: group.is_pinned(),
            tags: group.tags().to_vec(),
            tabs: group.tabs().iter().map(TabView::from_tab).collect(),
        }
    }

    /// Heading line, e.g. `* Review [bug, ui] (3)` for a pinned group.
    pub fn heading(&self) -> String {
        let mut line = String::new();
        if self.pinned {
            line.push_str("* ");
        }
        line.push_str(&self.label);
        if !self.tags.is_empty() {
            line.push_str(&format!(" [{}]", self.tags.join(", ")));
        }
        line.push_str(&format!(" ({})", self.tabs.len()));
        line
    }
}

/// Indented plain-text tree of `groups`.
pub fn render_tree(groups: &[GroupView]) -> String {
    let mut out = String::new();
    for group in groups {
        out.push_str(&group.heading());
        out.push_str(&format!("  {}\n", group.id));
        for tab in &group.tabs {
            out.push_str(&format!("    {} {}\n", tab.label, tab.path));
        }
    }
    out
}
