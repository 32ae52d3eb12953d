//! Centralized path definitions for kwalitee
//!
//! ## Storage Layout
//!
//! ```text
//! ~/.config/kwalitee/
//! └── config.toml               # Service configuration
//!
//! ~/.local/share/kwalitee/
//! └── kwalitee.db               # Verdict store (SQLite)
//!
//! repo/
//! └── .kwalitee.toml            # Per-repository overrides, read from the base branch
//! ```

use std::ffi::OsString;
use std::path::PathBuf;

/// Application directory name
const APP_DIR: &str = "kwalitee";

/// Config filename
const CONFIG_FILE: &str = "config.toml";

/// Database filename
const DATABASE_FILE: &str = "kwalitee.db";

/// Per-repository override filename
pub const REPO_CONFIG: &str = ".kwalitee.toml";

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "KWALITEE_CONFIG";

/// Get the config directory.
///
/// Returns `~/.config/kwalitee/` on Linux.
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR)
}

/// Get the default config file path.
#[must_use]
pub fn default_config() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

/// Get the data directory holding the verdict store.
#[must_use]
pub fn data_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR)
}

/// Get the default database path.
#[must_use]
pub fn default_database() -> PathBuf {
    data_dir().join(DATABASE_FILE)
}

/// Resolve the config file location.
///
/// The explicit path wins, then `KWALITEE_CONFIG`, then the default.
#[must_use]
pub fn resolve_config(explicit: Option<PathBuf>) -> PathBuf {
    choose_config(explicit, std::env::var_os(CONFIG_ENV))
}

fn choose_config(explicit: Option<PathBuf>, from_env: Option<OsString>) -> PathBuf {
    explicit
        .or_else(|| from_env.filter(|v| !v.is_empty()).map(PathBuf::from))
        .unwrap_or_else(default_config)
}
