use std::io;
use std::path::{Path, PathBuf};

/// Environment variable that relocates the whole storage root.
pub const HOME_ENV: &str = "TAB_GROUPS_HOME";

/// Get the tab-groups directory (`$TAB_GROUPS_HOME` or `~/.tab-groups`)
pub fn get_tab_groups_dir() -> io::Result<PathBuf> {
    if let Ok(custom) = std::env::var(HOME_ENV) {
        if !custom.trim().is_empty() {
            return Ok(PathBuf::from(custom));
        }
    }
    let home = dirs::home_dir().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "Home directory not found")
    })?;
    Ok(home.join(".tab-groups"))
}

/// Get the directory diagnostics are written to
pub fn get_log_dir() -> io::Result<PathBuf> {
    Ok(log_dir_in(&get_tab_groups_dir()?))
}

/// Log directory under an explicit storage root
pub fn log_dir_in(root: &Path) -> PathBuf {
    root.join("logs")
}
