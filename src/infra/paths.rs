// src/infra/paths.rs — Config path management
//
// PROMPTSMITH_HOME overrides the config directory for isolation (tests, CI).
// When unset, config lives under ~/.promptsmith/.

use std::path::PathBuf;

/// Returns the PROMPTSMITH_HOME override, if set.
fn promptsmith_home() -> Option<PathBuf> {
    std::env::var_os("PROMPTSMITH_HOME").map(PathBuf::from)
}

/// Configuration directory: $PROMPTSMITH_HOME/ or ~/.promptsmith/
///
/// Returns `None` only when no home directory can be determined.
pub fn config_dir() -> Option<PathBuf> {
    if let Some(home) = promptsmith_home() {
        return Some(home);
    }
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(".promptsmith"))
}

/// Main config file
pub fn config_file_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
