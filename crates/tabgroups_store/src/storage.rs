//! Persistent storage for tab group records.
//!
//! Records are serialized transfer forms addressed by a fixed key. The file
//! backend writes atomically through a temp file and keeps three rotating
//! backups; loading falls back to the newest backup and finally to an empty
//! default, so a corrupt file never blocks startup.

use std::collections::BTreeMap;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex as PLMutex;
use tabgroups_model::ModelResult;
use tabgroups_shared::{diagnostics, paths};

use crate::error::{StoreError, StoreResult};

/// Key of the active tabs state record.
pub const STATE_KEY: &str = "tabs-state";
/// Key of the branch store record.
pub const BRANCHES_KEY: &str = "branches";
/// Key of the per-group access tracking record.
pub const ACCESS_KEY: &str = "group-access";

/// Key/value persistence supplied by the host.
pub trait RecordStore: Send + Sync {
    /// Reads the record for `key`, `None` when it was never written.
    fn read(&self, key: &str) -> StoreResult<Option<String>>;

    fn write(&self, key: &str, contents: &str) -> StoreResult<()>;

    /// Reads the most recent backup of `key`, if the backend keeps any.
    fn read_backup(&self, _key: &str) -> StoreResult<Option<String>> {
        Ok(None)
    }
}

/// File-backed storage rooted at `<root>/profiles/<profile>/`.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    profile: String,
}

impl Storage {
    pub fn new(root: PathBuf, profile: String) -> Self {
        Self { root, profile }
    }

    fn file_path(&self, key: &str) -> PathBuf {
        let profile_dir = self.root.join("profiles").join(&self.profile);
        profile_dir.join(format!("{key}.json"))
    }

    fn rotate_backups(&self, path: &Path) {
        if !path.exists() {
            return;
        }

        let bak2 = path.with_extension("json.bak.2");
        let bak1 = path.with_extension("json.bak.1");
        let bak = path.with_extension("json.bak");

        if let Err(e) = fs::remove_file(&bak2) {
            if e.kind() != std::io::ErrorKind::NotFound {
                diagnostics::log(format!("backup_warning: remove bak2 failed: {}", e));
            }
        }
        if bak1.exists() {
            if let Err(e) = fs::rename(&bak1, &bak2) {
                diagnostics::log(format!("backup_warning: rotate bak1->bak2 failed: {}", e));
            }
        }
        if bak.exists() {
            if let Err(e) = fs::rename(&bak, &bak1) {
                diagnostics::log(format!("backup_warning: rotate bak->bak1 failed: {}", e));
            }
        }
        if let Err(e) = fs::rename(path, &bak) {
            diagnostics::log(format!("backup_warning: create backup failed: {}", e));
        }
    }
}

fn read_optional(key: &str, path: &Path) -> StoreResult<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|e| StoreError::read(key, e))
}

impl RecordStore for Storage {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        read_optional(key, &self.file_path(key))
    }

    fn write(&self, key: &str, contents: &str) -> StoreResult<()> {
        let path = self.file_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::write(key, e))?;
        }
        self.rotate_backups(&path);
        let tmp_path = path.with_extension("json.tmp");
        let file = fs::File::create(&tmp_path).map_err(|e| StoreError::write(key, e))?;
        let mut writer = BufWriter::new(file);
        use std::io::Write;
        writer
            .write_all(contents.as_bytes())
            .map_err(|e| StoreError::write(key, e))?;
        writer.flush().map_err(|e| StoreError::write(key, e))?;
        fs::rename(&tmp_path, &path).map_err(|e| StoreError::write(key, e))?;
        Ok(())
    }

    fn read_backup(&self, key: &str) -> StoreResult<Option<String>> {
        read_optional(key, &self.file_path(key).with_extension("json.bak"))
    }
}

/// In-memory storage, shared between clones. Used by tests and by hosts that
/// manage persistence themselves.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    records: Arc<PLMutex<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.records.lock().get(key).cloned()
    }

    pub fn insert(&self, key: &str, contents: impl Into<String>) {
        self.records.lock().insert(key.to_string(), contents.into());
    }
}

impl RecordStore for MemoryStorage {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.get(key))
    }

    fn write(&self, key: &str, contents: &str) -> StoreResult<()> {
        self.insert(key, contents);
        Ok(())
    }
}

/// Loads and decodes the record for `key`.
///
/// A missing record yields `T::default()`. An unreadable or unparseable
/// record falls back to the backup, then to `T::default()`; failures are
/// logged, never returned.
pub fn load_record<S, T, F>(storage: &S, key: &str, parse: F) -> T
where
    S: RecordStore + ?Sized,
    T: Default,
    F: Fn(&str) -> ModelResult<T>,
{
    let primary = match storage.read(key) {
        Ok(Some(data)) => data,
        Ok(None) => return T::default(),
        Err(e) => {
            log::warn!("failed to read {key}: {e}");
            diagnostics::log(format!("load_read_error key={} error={}", key, e));
            String::new()
        }
    };
    match parse(&primary) {
        Ok(value) => return value,
        Err(e) => {
            log::warn!("failed to parse {key}: {e}");
            diagnostics::log(format!("load_parse_error key={} error={}", key, e));
        }
    }
    if let Ok(Some(backup)) = storage.read_backup(key) {
        if let Ok(value) = parse(&backup) {
            log::info!("recovered {key} from backup");
            return value;
        }
    }
    log::warn!("starting with empty {key}");
    T::default()
}

pub fn default_storage_root() -> PathBuf {
    paths::get_tab_groups_dir().unwrap_or_else(|_| Path::new("/").join(".tab-groups"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabgroups_model::{BranchStore, TabItem, TabsState};
    use tempfile::TempDir;

    fn sample_state() -> TabsState {
        let mut state = TabsState::new();
        state.create_group(
            Some("Saved".into()),
            vec![TabItem::new("/src/lib.rs", None, None)],
        );
        state
    }

    #[test]
    fn test_load_missing_creates_default() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf(), "test".to_string());
        let state: TabsState = load_record(&storage, STATE_KEY, TabsState::from_json);
        assert!(state.is_empty());
        let branches: BranchStore = load_record(&storage, BRANCHES_KEY, BranchStore::from_json);
        assert!(branches.is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf(), "test".to_string());
        storage
            .write(STATE_KEY, &sample_state().to_json().unwrap())
            .unwrap();

        let loaded: TabsState = load_record(&storage, STATE_KEY, TabsState::from_json);
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_path("/src/lib.rs"));
    }

    #[test]
    fn test_backup_rotation() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf(), "test".to_string());

        for i in 0..4 {
            storage.write(STATE_KEY, &format!("{{\"groups\":{{}},\"n\":{}}}", i)).unwrap();
        }

        let path = storage.file_path(STATE_KEY);
        assert!(path.exists(), "main file must exist");
        assert!(path.with_extension("json.bak").exists(), "backup 1 must exist");
        assert!(path.with_extension("json.bak.1").exists(), "backup 2 must exist");
        assert!(path.with_extension("json.bak.2").exists(), "backup 3 must exist");
        assert!(!path.with_extension("json.tmp").exists(), "temp file must be renamed");
    }

    #[test]
    fn test_load_from_backup_on_corrupt_main_file() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf(), "test".to_string());
        let json = sample_state().to_json().unwrap();
        storage.write(STATE_KEY, &json).unwrap();
        storage.write(STATE_KEY, &json).unwrap();

        fs::write(storage.file_path(STATE_KEY), "invalid json").unwrap();

        let loaded: TabsState = load_record(&storage, STATE_KEY, TabsState::from_json);
        assert!(loaded.contains_path("/src/lib.rs"), "backup must be loaded on corruption");
    }

    #[test]
    fn test_corrupt_without_backup_yields_empty() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf(), "test".to_string());
        let path = storage.file_path(BRANCHES_KEY);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{\"branches\": 42").unwrap();

        let loaded: BranchStore = load_record(&storage, BRANCHES_KEY, BranchStore::from_json);
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_storage_path_follows_profile_convention() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf(), "custom-profile".to_string());
        let path = storage.file_path(STATE_KEY);

        let path_str = path.to_string_lossy();
        assert!(path_str.contains("profiles"), "path must contain profiles directory");
        assert!(path_str.contains("custom-profile"), "path must contain profile name");
        assert!(path_str.ends_with("tabs-state.json"), "file must be named after the key");
    }

    #[test]
    fn test_write_failure_names_the_record() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("root");
        fs::write(&blocker, "not a directory").unwrap();
        let storage = Storage::new(blocker, "test".to_string());

        let err = storage.write(STATE_KEY, "{}").unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert_eq!(err.key(), Some(STATE_KEY));
    }

    #[test]
    fn test_memory_storage_is_shared_between_clones() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        storage.write(STATE_KEY, "{}").unwrap();
        assert_eq!(other.read(STATE_KEY).unwrap().as_deref(), Some("{}"));
        assert!(other.read_backup(STATE_KEY).unwrap().is_none());
    }
}
