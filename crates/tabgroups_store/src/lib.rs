//! Persistence for the tab group engine.
//!
//! [`TabsStore`] owns the active [`TabsState`], the [`BranchStore`] of parked
//! branch snapshots and the per-group access records. Every mutation goes
//! through the in-memory state first and is then written behind through a
//! [`DebouncedStorage`]; a failed write is reported but never rolls the
//! in-memory mutation back.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let store = TabsStore::open_default_profile(500);
//!
//! let id = store.update(|state| state.create_group(Some("Review".into()), tabs))?;
//! store.update(|state| state.set_pinned(&id, true))?;
//!
//! // Source control moved from `main` to `feature/x`.
//! store.switch_branch(Some("main"), "feature/x")?;
//!
//! store.flush()?;
//! ```

pub mod debounce;
pub mod error;
pub mod storage;

pub use debounce::DebouncedStorage;
pub use error::{StoreError, StoreResult};
pub use storage::{
    ACCESS_KEY, BRANCHES_KEY, MemoryStorage, RecordStore, STATE_KEY, Storage,
    default_storage_root, load_record,
};

use parking_lot::Mutex;
use tabgroups_model::{
    AccessTracker, BranchStore, ModelError, ModelResult, SortMode, TabsGroup, TabsState,
};

/// Result of switching the active branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchSwitch {
    /// A stored snapshot for the target branch became the active state.
    Restored { groups: usize },
    /// The target branch had no snapshot; the active state starts empty.
    Fresh,
}

/// Store for the active tab groups, parked branches and access records.
pub struct TabsStore<S: RecordStore + Clone + 'static = Storage> {
    storage: DebouncedStorage<S>,
    state: Mutex<TabsState>,
    branches: Mutex<BranchStore>,
    access: Mutex<AccessTracker>,
}

impl TabsStore<Storage> {
    /// Opens the store for the default profile.
    pub fn open_default_profile(debounce_ms: u64) -> Self {
        Self::open_profile(default_storage_root(), "default", debounce_ms)
    }

    /// Opens the store for a specific profile under `root`.
    pub fn open_profile(
        root: std::path::PathBuf,
        profile: impl Into<String>,
        debounce_ms: u64,
    ) -> Self {
        Self::open(Storage::new(root, profile.into()), debounce_ms)
    }
}

fn parse_access(json: &str) -> ModelResult<AccessTracker> {
    Ok(serde_json::from_str(json)?)
}

impl<S: RecordStore + Clone + 'static> TabsStore<S> {
    /// Loads every record from `storage`. Unreadable records start empty.
    pub fn open(storage: S, debounce_ms: u64) -> Self {
        let state = load_record(&storage, STATE_KEY, TabsState::from_json);
        let branches = load_record(&storage, BRANCHES_KEY, BranchStore::from_json);
        let access = load_record(&storage, ACCESS_KEY, parse_access);
        log::info!(
            "loaded {} group(s) and {} branch snapshot(s)",
            state.len(),
            branches.len()
        );
        Self {
            storage: DebouncedStorage::new(storage, debounce_ms),
            state: Mutex::new(state),
            branches: Mutex::new(branches),
            access: Mutex::new(access),
        }
    }

    pub fn storage(&self) -> &S {
        self.storage.inner()
    }

    /// Returns a copy of the active state.
    pub fn state(&self) -> TabsState {
        self.state.lock().clone()
    }

    /// Runs a read-only query against the active state.
    pub fn read<R>(&self, f: impl FnOnce(&TabsState) -> R) -> R {
        f(&self.state.lock())
    }

    /// Applies one logical mutation to the active state, then persists it.
    ///
    /// The mutation is kept even when persisting fails.
    pub fn update<R>(&self, f: impl FnOnce(&mut TabsState) -> R) -> StoreResult<R> {
        let mut state = self.state.lock();
        let result = f(&mut state);
        self.persist_state(&state)?;
        Ok(result)
    }

    /// Replaces the active state wholesale, e.g. after an import.
    pub fn replace_state(&self, state: TabsState) -> StoreResult<()> {
        let mut current = self.state.lock();
        *current = state;
        self.persist_state(&current)
    }

    fn persist_state(&self, state: &TabsState) -> StoreResult<()> {
        self.storage.save(STATE_KEY, state.to_json()?)
    }

    fn persist_branches(&self, branches: &BranchStore) -> StoreResult<()> {
        self.storage.save(BRANCHES_KEY, branches.to_json()?)
    }

    fn persist_access(&self, access: &AccessTracker) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(access)
            .map_err(|e| ModelError::Serialize(e.to_string()))?;
        self.storage.save(ACCESS_KEY, json)
    }

    pub fn list_branches(&self) -> Vec<String> {
        self.branches.lock().list_branches()
    }

    /// Returns a copy of the snapshot stored for `branch`, ids included.
    pub fn branch_snapshot(&self, branch: &str) -> Option<TabsState> {
        self.branches.lock().get(branch).cloned()
    }

    /// Parks a copy of the active state under `branch`. Group ids are kept so
    /// references held elsewhere stay valid.
    pub fn archive_active(&self, branch: &str) -> StoreResult<()> {
        let snapshot = self.state.lock().deep_clone(true);
        let mut branches = self.branches.lock();
        branches.archive(branch, snapshot);
        self.persist_branches(&branches)
    }

    /// Makes a fresh copy of the snapshot for `branch` the active state. The
    /// snapshot stays in the store. Returns `false` when no snapshot exists.
    pub fn restore_branch(&self, branch: &str) -> StoreResult<bool> {
        let restored = self.branches.lock().restore(branch);
        match restored {
            Some(state) => {
                self.replace_state(state)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Parks the active state under `from` (when known) and activates the
    /// snapshot for `to`, or an empty state carrying over the blacklist.
    ///
    /// Not atomic across the two records: a crash between the writes can
    /// leave them out of step.
    pub fn switch_branch(&self, from: Option<&str>, to: &str) -> StoreResult<BranchSwitch> {
        let mut state = self.state.lock();
        let mut branches = self.branches.lock();

        if let Some(from) = from {
            branches.archive(from, state.deep_clone(true));
        }
        let outcome = match branches.restore(to) {
            Some(restored) => {
                let groups = restored.len();
                *state = restored;
                BranchSwitch::Restored { groups }
            }
            None => {
                let mut fresh = TabsState::new();
                for pattern in state.blacklist() {
                    fresh.add_to_blacklist(pattern.clone());
                }
                *state = fresh;
                BranchSwitch::Fresh
            }
        };
        log::info!("switched branch {:?} -> {to}: {outcome:?}", from);

        self.persist_branches(&branches)?;
        self.persist_state(&state)?;
        Ok(outcome)
    }

    pub fn delete_branch(&self, branch: &str) -> StoreResult<bool> {
        let mut branches = self.branches.lock();
        if branches.delete_branch(branch).is_none() {
            return Ok(false);
        }
        self.persist_branches(&branches)?;
        Ok(true)
    }

    /// Adds every branch of `imported`, replacing same-named snapshots.
    pub fn import_branches(&self, imported: &BranchStore) -> StoreResult<usize> {
        let mut branches = self.branches.lock();
        let names = imported.list_branches();
        for name in &names {
            if let Some(snapshot) = imported.get(name) {
                branches.archive(name.clone(), snapshot.clone());
            }
        }
        self.persist_branches(&branches)?;
        Ok(names.len())
    }

    pub fn export_branches(&self) -> StoreResult<String> {
        Ok(self.branches.lock().to_json()?)
    }

    /// Records that the user opened or focused a group.
    pub fn touch_group(&self, group_id: &str) -> StoreResult<()> {
        let mut access = self.access.lock();
        access.touch(group_id);
        self.persist_access(&access)
    }

    /// Drops access records for groups that no longer exist.
    pub fn prune_access(&self) -> StoreResult<usize> {
        let state = self.state.lock();
        let mut access = self.access.lock();
        let pruned = access.prune_orphans(&state);
        if pruned > 0 {
            self.persist_access(&access)?;
        }
        Ok(pruned)
    }

    /// Copies of the active groups in the requested order.
    pub fn sorted_groups(&self, mode: SortMode) -> Vec<TabsGroup> {
        let state = self.state.lock();
        let access = self.access.lock();
        access
            .sorted_groups(&state, mode)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Writes every pending record now.
    pub fn flush(&self) -> StoreResult<()> {
        self.storage.flush()
    }
}
