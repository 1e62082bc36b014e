//! Applying an externally proposed grouping of open tabs.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::state::TabsState;
use crate::tab_item::{TabItem, normalize_path};

/// A grouping suggested by something outside the engine, e.g. an assistant
/// that clusters open tabs by topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingProposal {
    #[serde(default)]
    pub groups: Vec<ProposedGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedGroup {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub paths: Vec<String>,
}

impl TabsState {
    /// Creates one group per proposal entry from the candidate tabs it lists.
    ///
    /// Each candidate lands in at most one group, the first entry naming it.
    /// Paths with no matching candidate are ignored and entries that end up
    /// with no tabs create nothing. Returns the new group ids in proposal order.
    pub fn apply_grouping(
        &mut self,
        proposal: &GroupingProposal,
        candidates: Vec<TabItem>,
    ) -> Vec<String> {
        let mut by_path: HashMap<String, TabItem> = HashMap::new();
        for tab in candidates {
            by_path.entry(tab.path()).or_insert(tab);
        }

        let mut created = Vec::new();
        for proposed in &proposal.groups {
            let tabs: Vec<TabItem> = proposed
                .paths
                .iter()
                .filter_map(|p| by_path.remove(&normalize_path(p)))
                .collect();
            let tabs = self.admissible(tabs, &HashSet::new());
            if tabs.is_empty() {
                continue;
            }
            let label = Some(proposed.label.trim())
                .filter(|l| !l.is_empty())
                .map(str::to_string);
            let id = self.create_group(label, tabs);
            self.set_group_tags(&id, proposed.tags.clone());
            created.push(id);
        }
        log::debug!(
            "applied grouping proposal: {} of {} group(s) created",
            created.len(),
            proposal.groups.len()
        );
        created
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::DEFAULT_GROUP_LABEL;

    fn candidates(paths: &[&str]) -> Vec<TabItem> {
        paths.iter().map(|p| TabItem::new(*p, None, None)).collect()
    }

    #[test]
    fn creates_groups_from_listed_paths() {
        let proposal: GroupingProposal = serde_json::from_str(
            r#"{"groups":[
                {"label":"Frontend","tags":["ui"],"paths":["/app.tsx","/missing.tsx"]},
                {"label":"Backend","paths":["/server.rs","file:///db.rs","/app.tsx"]},
                {"label":"Nothing","paths":["/nowhere"]}
            ]}"#,
        )
        .unwrap();
        let mut state = TabsState::new();
        let ids = state.apply_grouping(
            &proposal,
            candidates(&["/app.tsx", "/server.rs", "/db.rs", "/unused.md"]),
        );

        assert_eq!(ids.len(), 2);
        let frontend = state.group(&ids[0]).unwrap();
        assert_eq!(frontend.label(), "Frontend");
        assert_eq!(frontend.tags(), ["ui"]);
        assert_eq!(frontend.len(), 1);
        let backend = state.group(&ids[1]).unwrap();
        assert_eq!(backend.len(), 2);
        assert!(!state.contains_path("/unused.md"));
        assert!(state.verify_index());
    }

    #[test]
    fn blank_label_becomes_untitled() {
        let proposal = GroupingProposal {
            groups: vec![ProposedGroup {
                label: "  ".into(),
                tags: Vec::new(),
                paths: vec!["/a".into()],
            }],
        };
        let mut state = TabsState::new();
        let ids = state.apply_grouping(&proposal, candidates(&["/a"]));
        assert!(state.group(&ids[0]).unwrap().label().starts_with(DEFAULT_GROUP_LABEL));
    }

    #[test]
    fn blacklisted_only_entry_creates_nothing() {
        let proposal = GroupingProposal {
            groups: vec![ProposedGroup {
                label: "Secrets".into(),
                tags: Vec::new(),
                paths: vec!["/.env".into()],
            }],
        };
        let mut state = TabsState::new();
        state.add_to_blacklist("/.env");
        assert!(state.apply_grouping(&proposal, candidates(&["/.env"])).is_empty());
        assert!(state.is_empty());
    }

    #[test]
    fn skipped_entry_does_not_advance_untitled_counter() {
        let proposal = GroupingProposal {
            groups: vec![
                ProposedGroup {
                    label: String::new(),
                    tags: Vec::new(),
                    paths: vec!["/build.log".into()],
                },
                ProposedGroup {
                    label: String::new(),
                    tags: Vec::new(),
                    paths: vec!["/main.rs".into()],
                },
            ],
        };
        let mut state = TabsState::new();
        state.add_to_blacklist("*.log");
        let ids = state.apply_grouping(&proposal, candidates(&["/build.log", "/main.rs"]));
        assert_eq!(ids.len(), 1);
        assert_eq!(
            state.group(&ids[0]).unwrap().label(),
            format!("{DEFAULT_GROUP_LABEL} 1")
        );
    }
}
