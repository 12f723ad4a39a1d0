use anyhow::{bail, Context, Result};
use notify::{Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::event::SeederEvent;
use crate::servers::Server;

pub const MIN_REFRESH_INTERVAL_SECS: u64 = 5;
pub const MAX_REFRESH_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_PROCESS_NAME: &str = "bf4.exe";
pub const DEFAULT_PROFILE_URL: &str = "https://battlelog.battlefield.com/bf4/";

/// Root configuration structure. Deserialized from %APPDATA%\PureSeeder\config.toml.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: GlobalConfig,
    /// Servers in selection order.
    #[serde(default)]
    pub servers: Vec<Server>,
}

/// Seeder-wide settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalConfig {
    /// Account the seeder is expected to be logged in as.
    #[serde(default)]
    pub username: String,
    /// Master switch for automatic seeding.
    #[serde(default = "default_true")]
    pub seeding_enabled: bool,
    /// Whether a hung game process should be terminated. Unset means "never asked".
    #[serde(default)]
    pub hang_protection_enabled: Option<bool>,
    /// Minimize the game window after joining a server.
    #[serde(default = "default_true")]
    pub auto_minimize: bool,
    /// Executable name of the game (e.g. "bf4.exe") used for process detection.
    #[serde(default = "default_process_name")]
    pub process_name: String,
    /// Seconds between page refreshes. Clamped to [5, 3600].
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Profile page queried for the logged-in player's status.
    #[serde(default = "default_profile_url")]
    pub profile_url: String,
    /// Index into `servers`; negative or out-of-range values are clamped on read.
    #[serde(default)]
    pub current_server_index: i32,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            seeding_enabled: true,
            hang_protection_enabled: None,
            auto_minimize: true,
            process_name: DEFAULT_PROCESS_NAME.to_string(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            profile_url: DEFAULT_PROFILE_URL.to_string(),
            current_server_index: 0,
        }
    }
}

impl GlobalConfig {
    pub fn effective_refresh_interval(&self) -> u64 {
        self.refresh_interval_secs
            .clamp(MIN_REFRESH_INTERVAL_SECS, MAX_REFRESH_INTERVAL_SECS)
    }
}

impl Config {
    /// Rejects settings the daemon cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.global.process_name.trim().is_empty() {
            bail!("global.process_name must not be empty");
        }
        Ok(())
    }
}

/// Loads the config file at `path`, returning `Config::default()` if the file does not exist.
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Spawns a file watcher on the parent directory of `path`.  Whenever the config
/// file is created or modified and still validates, sends a `ConfigReloaded` event.
pub async fn watch_config(path: PathBuf, tx: mpsc::Sender<SeederEvent>) {
    let (watch_tx, mut watch_rx) = mpsc::channel::<notify::Event>(16);

    let mut watcher = match RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                let _ = watch_tx.blocking_send(event);
            }
        },
        NotifyConfig::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            warn!("failed to create config watcher: {e}");
            return;
        }
    };

    // Editors save atomically (write-new + rename), so watch the directory.
    let watch_dir = match path.parent() {
        Some(d) => d.to_path_buf(),
        None => {
            warn!("config path {} has no parent directory", path.display());
            return;
        }
    };

    if let Err(e) = watcher.watch(&watch_dir, RecursiveMode::NonRecursive) {
        warn!("failed to watch config directory: {e}");
        return;
    }

    while let Some(event) = watch_rx.recv().await {
        let affects_config = event.paths.iter().any(|p| p == path.as_path());
        let is_write = matches!(
            event.kind,
            notify::EventKind::Create(_) | notify::EventKind::Modify(_)
        );
        if !(affects_config && is_write) {
            continue;
        }

        match load_or_default(&path).and_then(|c| c.validate().map(|_| c)) {
            Ok(config) => {
                info!("config reloaded from {}", path.display());
                if tx.send(SeederEvent::ConfigReloaded(config)).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!("ignoring config change: {e:#}"),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_process_name() -> String {
    DEFAULT_PROCESS_NAME.to_string()
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

fn default_profile_url() -> String {
    DEFAULT_PROFILE_URL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn global_config_default_values() {
        let g = GlobalConfig::default();
        assert!(g.username.is_empty());
        assert!(g.seeding_enabled);
        assert!(g.hang_protection_enabled.is_none());
        assert!(g.auto_minimize);
        assert_eq!(g.process_name, DEFAULT_PROCESS_NAME);
        assert_eq!(g.refresh_interval_secs, DEFAULT_REFRESH_INTERVAL_SECS);
        assert_eq!(g.current_server_index, 0);
    }

    #[test]
    fn config_default_has_no_servers() {
        assert!(Config::default().servers.is_empty());
    }

    // ── effective_refresh_interval ────────────────────────────────────────────

    #[test]
    fn refresh_interval_clamps_to_bounds() {
        let mut g = GlobalConfig::default();
        g.refresh_interval_secs = 0;
        assert_eq!(g.effective_refresh_interval(), MIN_REFRESH_INTERVAL_SECS);
        g.refresh_interval_secs = 99_999;
        assert_eq!(g.effective_refresh_interval(), MAX_REFRESH_INTERVAL_SECS);
        g.refresh_interval_secs = 60;
        assert_eq!(g.effective_refresh_interval(), 60);
    }

    // ── validate ──────────────────────────────────────────────────────────────

    #[test]
    fn validate_rejects_blank_process_name() {
        let mut c = Config::default();
        c.global.process_name = "  ".to_string();
        assert!(c.validate().is_err());
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    // ── load_or_default ───────────────────────────────────────────────────────

    #[test]
    fn load_or_default_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_or_default(&dir.path().join("nonexistent.toml")).unwrap();
        assert_eq!(config.global.process_name, DEFAULT_PROCESS_NAME);
        assert!(config.servers.is_empty());
    }

    #[test]
    fn load_or_default_parses_valid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[global]
username = "SeedBot"
seeding_enabled = false
hang_protection_enabled = true
auto_minimize = false
process_name = "bf3.exe"
refresh_interval_secs = 45
current_server_index = -1

[[servers]]
address = "https://battlelog.battlefield.com/bf4/servers/show/pc/abc"
name = "Alpha"
min_players = 2
max_players = 40
"#,
        )
        .unwrap();

        let config = load_or_default(&path).unwrap();
        assert_eq!(config.global.username, "SeedBot");
        assert!(!config.global.seeding_enabled);
        assert_eq!(config.global.hang_protection_enabled, Some(true));
        assert!(!config.global.auto_minimize);
        assert_eq!(config.global.process_name, "bf3.exe");
        assert_eq!(config.global.refresh_interval_secs, 45);
        assert_eq!(config.global.current_server_index, -1);
        assert_eq!(config.servers.len(), 1);
        assert_eq!(config.servers[0].name, "Alpha");
        assert_eq!(config.servers[0].min_players, 2);
        assert_eq!(config.servers[0].max_players, 40);
    }

    #[test]
    fn load_or_default_partial_toml_uses_field_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[global]\nusername = \"SeedBot\"\n").unwrap();

        let config = load_or_default(&path).unwrap();
        assert_eq!(config.global.username, "SeedBot");
        assert!(config.global.seeding_enabled);
        assert_eq!(config.global.profile_url, DEFAULT_PROFILE_URL);
    }

    #[test]
    fn load_or_default_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is not valid toml ][[[").unwrap();
        assert!(load_or_default(&path).is_err());
    }
}
