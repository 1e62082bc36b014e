use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tabgroups_model::SortMode;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Storage root override; `None` uses `$TAB_GROUPS_HOME` or `~/.tab-groups`
    #[serde(default)]
    pub storage_root: Option<PathBuf>,

    /// Profile directory under `<root>/profiles/`
    #[serde(default = "default_profile")]
    pub profile: String,

    /// Write-behind delay for persisted records, 0 writes through
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Enable the diagnostics log file
    #[serde(default)]
    pub diagnostics: bool,

    /// Path patterns never captured into a group; seeds new states
    #[serde(default)]
    pub blacklist: Vec<String>,

    /// Order used when listing groups
    #[serde(default)]
    pub sort_mode: SortMode,
}

fn default_profile() -> String {
    "default".to_string()
}

fn default_debounce_ms() -> u64 {
    500
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_root: None,
            profile: default_profile(),
            debounce_ms: default_debounce_ms(),
            diagnostics: false,
            blacklist: Vec::new(),
            sort_mode: SortMode::default(),
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn settings_path() -> PathBuf {
        tabgroups_store::default_storage_root().join("config.toml")
    }

    /// Load settings from the default path, or return defaults if the file
    /// doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::settings_path())
    }

    /// Load settings from `path`. A missing file yields defaults; a malformed
    /// one is an error.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse settings file {}", path.display()))
    }

    /// Save settings to `path`
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn storage_root(&self) -> PathBuf {
        self.storage_root
            .clone()
            .unwrap_or_else(tabgroups_store::default_storage_root)
    }
}
