//! Application context handed to every command.

use parking_lot::Mutex;
use tabgroups_model::{
    ImportedData, ModelError, SortMode, TabsGroup, TabsState, detect_import, normalize_path,
};
use tabgroups_store::{BranchSwitch, RecordStore, Storage, StoreResult, TabsStore};

use crate::settings::Settings;

/// Everything a host needs to drive the tab group engine: the loaded
/// settings, the store and the name of the branch the active state belongs
/// to.
///
/// Created once at startup and passed by reference; nothing here is global.
pub struct AppContext<S: RecordStore + Clone + 'static = Storage> {
    settings: Settings,
    store: TabsStore<S>,
    current_branch: Mutex<Option<String>>,
}

impl AppContext<Storage> {
    /// Opens the file-backed store described by `settings`.
    pub fn open(settings: Settings) -> Self {
        let store = TabsStore::open_profile(
            settings.storage_root(),
            settings.profile.clone(),
            settings.debounce_ms,
        );
        Self::with_store(settings, store)
    }
}

impl<S: RecordStore + Clone + 'static> AppContext<S> {
    pub fn with_store(settings: Settings, store: TabsStore<S>) -> Self {
        let ctx = Self {
            settings,
            store,
            current_branch: Mutex::new(None),
        };
        ctx.seed_blacklist();
        ctx
    }

    fn seed_blacklist(&self) {
        if self.settings.blacklist.is_empty() {
            return;
        }
        let missing = self.store.read(|state| {
            self.settings
                .blacklist
                .iter()
                .any(|pattern| !state.blacklist().contains(&normalize_path(pattern)))
        });
        if !missing {
            return;
        }
        let patterns = self.settings.blacklist.clone();
        if let Err(e) = self.store.update(|state| {
            for pattern in patterns {
                state.add_to_blacklist(pattern);
            }
        }) {
            log::warn!("failed to persist configured blacklist: {e}");
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &TabsStore<S> {
        &self.store
    }

    pub fn current_branch(&self) -> Option<String> {
        self.current_branch.lock().clone()
    }

    /// Tells the context which branch the active state belongs to without
    /// touching any stored state, e.g. on startup.
    pub fn set_current_branch(&self, branch: Option<String>) {
        *self.current_branch.lock() = branch;
    }

    /// Source control moved to `branch`: park the active state under the
    /// previous branch and activate the snapshot for `branch`.
    pub fn on_branch_changed(&self, branch: &str) -> StoreResult<BranchSwitch> {
        let mut current = self.current_branch.lock();
        if current.as_deref() == Some(branch) {
            return Ok(BranchSwitch::Restored {
                groups: self.store.read(TabsState::len),
            });
        }
        let outcome = self.store.switch_branch(current.as_deref(), branch)?;
        *current = Some(branch.to_string());
        Ok(outcome)
    }

    /// A watched file was deleted: drop it from every group. Returns the ids
    /// of the groups that lost a tab.
    pub fn on_file_deleted(&self, path: &str) -> StoreResult<Vec<String>> {
        let touched = self.store.update(|state| state.remove_tab_from_all_groups(path))?;
        if !touched.is_empty() {
            log::debug!("removed {path} from {} group(s)", touched.len());
            self.store.prune_access()?;
        }
        Ok(touched)
    }

    /// Groups in the configured display order.
    pub fn sorted_groups(&self) -> Vec<TabsGroup> {
        self.sorted_groups_by(self.settings.sort_mode)
    }

    pub fn sorted_groups_by(&self, mode: SortMode) -> Vec<TabsGroup> {
        self.store.sorted_groups(mode)
    }

    /// Loads an exported state or branch store.
    ///
    /// A state's groups are added to the active state as fresh copies and its
    /// blacklist is merged in; branch snapshots replace same-named ones.
    pub fn import_json(&self, json: &str) -> Result<ImportSummary, ImportError> {
        match detect_import(json)? {
            ImportedData::State(imported) => {
                let fresh = imported.deep_clone(false);
                let groups = self.store.update(|state| {
                    for pattern in fresh.blacklist() {
                        state.add_to_blacklist(pattern.clone());
                    }
                    let mut added = 0;
                    for group in fresh.groups() {
                        if state.add_tabs_group(group.clone()) {
                            added += 1;
                        }
                    }
                    added
                })?;
                Ok(ImportSummary::Groups(groups))
            }
            ImportedData::Branches(branches) => {
                let count = self.store.import_branches(&branches)?;
                Ok(ImportSummary::Branches(count))
            }
        }
    }

    pub fn export_state_json(&self) -> Result<String, ImportError> {
        Ok(self.store.read(TabsState::to_json)?)
    }

    pub fn export_branches_json(&self) -> Result<String, ImportError> {
        Ok(self.store.export_branches()?)
    }

    pub fn flush(&self) -> StoreResult<()> {
        self.store.flush()
    }
}

/// What an import added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportSummary {
    Groups(usize),
    Branches(usize),
}

/// Import and export failures.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Format(#[from] ModelError),
    #[error(transparent)]
    Store(#[from] tabgroups_store::StoreError),
}
