/// Canonical file paths for the seeder's data files.
///
/// Both files live under %APPDATA%\PureSeeder\ (or ~/.config/PureSeeder when
/// APPDATA is not set):
///   - config.toml  Edited by the user, read (and watched) by the daemon.
///   - status.toml  Written by the daemon, read by the presentation layer.
use std::path::PathBuf;

const APP_DIR_NAME: &str = "PureSeeder";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const STATUS_FILE_NAME: &str = "status.toml";

/// Returns the application data directory.
pub fn app_data_dir() -> PathBuf {
    base_dir().join(APP_DIR_NAME)
}

fn base_dir() -> PathBuf {
    if let Some(appdata) = std::env::var_os("APPDATA") {
        return PathBuf::from(appdata);
    }
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".config"),
        None => PathBuf::from("."),
    }
}

pub fn config_file_path() -> PathBuf {
    app_data_dir().join(CONFIG_FILE_NAME)
}

pub fn status_file_path() -> PathBuf {
    app_data_dir().join(STATUS_FILE_NAME)
}
