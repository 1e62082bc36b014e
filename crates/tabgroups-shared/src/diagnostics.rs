use std::fs::{create_dir_all, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    OnceLock,
};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::paths;

const DIAG_ENV: &str = "TAB_GROUPS_DIAG";

static DIAG_ENABLED: AtomicBool = AtomicBool::new(false);
static DIAG_ENABLED_INIT: OnceLock<()> = OnceLock::new();
static LOG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Explicitly set diagnostics enabled state. Call early in main().
/// If not called, falls back to checking TAB_GROUPS_DIAG env var.
pub fn set_enabled(enabled: bool) {
    DIAG_ENABLED.store(enabled, Ordering::Relaxed);
    let _ = DIAG_ENABLED_INIT.set(());
}

fn diagnostics_enabled() -> bool {
    if DIAG_ENABLED_INIT.get().is_some() {
        return DIAG_ENABLED.load(Ordering::Relaxed);
    }

    let env_enabled = std::env::var(DIAG_ENV)
        .map(|v| parse_flag(&v))
        .unwrap_or(false);
    if env_enabled {
        DIAG_ENABLED.store(true, Ordering::Relaxed);
    }
    let _ = DIAG_ENABLED_INIT.set(());
    env_enabled
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Directs diagnostics into `<root>/logs`. Call early in main(), before the
/// first diagnostic is recorded; returns `false` if the directory was
/// already fixed.
pub fn set_storage_root(root: &Path) -> bool {
    LOG_DIR.set(Some(paths::log_dir_in(root))).is_ok()
}

fn diagnostics_path() -> Option<PathBuf> {
    log_dir().map(|dir| dir.join("diagnostics.log"))
}

/// Directory the diagnostics file lives in. Defaults to the log directory of
/// `$TAB_GROUPS_HOME` or `~/.tab-groups`.
pub fn log_dir() -> Option<PathBuf> {
    LOG_DIR.get_or_init(|| paths::get_log_dir().ok()).clone()
}

fn format_line(message: &str) -> String {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown-time".to_string());
    format!("[{}] {}\n", timestamp, message)
}

/// Records a diagnostic event. Always forwarded to the `log` facade at debug
/// level; appended to the diagnostics file only when diagnostics are enabled.
pub fn log(message: impl AsRef<str>) {
    log::debug!(target: "tabgroups::diag", "{}", message.as_ref());
    if !diagnostics_enabled() {
        return;
    }

    if let Some(path) = diagnostics_path() {
        append_line(&path, message.as_ref());
    }
}

fn append_line(path: &Path, message: &str) {
    if let Some(parent) = path.parent() {
        let _ = create_dir_all(parent);
    }
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = file.write_all(format_line(message).as_bytes());
    }
}
