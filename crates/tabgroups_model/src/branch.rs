//! Parked per-branch snapshots of the group collection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::state::{TabsState, TabsStateData};

/// Branch name → parked [`TabsState`].
///
/// States move in by value, so a snapshot never shares structure with the
/// active state it was taken from. [`BranchStore::restore`] hands out a copy
/// under fresh ids and keeps the stored snapshot in place.
#[derive(Debug, Clone, Default)]
pub struct BranchStore {
    branches: BTreeMap<String, TabsState>,
}

impl BranchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `state` under `branch`, replacing and returning any previous
    /// snapshot. The stored state is tagged with the branch name.
    pub fn archive(&mut self, branch: impl Into<String>, mut state: TabsState) -> Option<TabsState> {
        let branch = branch.into();
        state.set_branch_name(Some(branch.clone()));
        log::debug!("archiving {} group(s) under branch {branch}", state.len());
        self.branches.insert(branch, state)
    }

    /// Returns an independent copy of the stored snapshot, with fresh group
    /// and tab ids, ready to become the active state.
    pub fn restore(&self, branch: &str) -> Option<TabsState> {
        let stored = self.branches.get(branch)?;
        let mut state = stored.deep_clone(false);
        state.set_branch_name(None);
        Some(state)
    }

    pub fn get(&self, branch: &str) -> Option<&TabsState> {
        self.branches.get(branch)
    }

    pub fn contains(&self, branch: &str) -> bool {
        self.branches.contains_key(branch)
    }

    pub fn delete_branch(&mut self, branch: &str) -> Option<TabsState> {
        self.branches.remove(branch)
    }

    /// Branch names in sorted order.
    pub fn list_branches(&self) -> Vec<String> {
        self.branches.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn to_transfer(&self) -> BranchStoreData {
        BranchStoreData {
            branches: self
                .branches
                .iter()
                .map(|(name, state)| (name.clone(), state.to_transfer()))
                .collect(),
        }
    }

    pub fn from_transfer(data: BranchStoreData) -> Self {
        let mut store = Self::new();
        for (name, state) in data.branches {
            store.archive(name, TabsState::from_transfer(state));
        }
        store
    }

    pub fn to_json(&self) -> ModelResult<String> {
        serde_json::to_string_pretty(&self.to_transfer())
            .map_err(|e| ModelError::Serialize(e.to_string()))
    }

    pub fn from_json(json: &str) -> ModelResult<Self> {
        let data: BranchStoreData = serde_json::from_str(json)?;
        Ok(Self::from_transfer(data))
    }

    pub fn from_json_or_default(json: &str) -> Self {
        Self::from_json(json).unwrap_or_else(|e| {
            log::warn!("discarding unreadable branch store: {e}");
            Self::default()
        })
    }
}

/// Persisted form of a [`BranchStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchStoreData {
    #[serde(default)]
    pub branches: BTreeMap<String, TabsStateData>,
}
