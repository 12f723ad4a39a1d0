use serde::Serialize;
use std::path::Path;
use tracing::warn;

use crate::coordinator::CoordinatorState;
use crate::decision::{KickReason, SeedReason};
use crate::profile::PlayerStatus;
use crate::result_reason::ResultReason;
use crate::session::{SessionState, UserStatus};

/// Runtime status written by the daemon to %APPDATA%\PureSeeder\status.toml
/// after every refresh. The presentation layer reads this file (read-only).
#[derive(Debug, Serialize)]
pub struct SeederStatus {
    /// Daemon binary version (set from Cargo.toml at compile time).
    pub version: String,
    /// RFC 3339 timestamp of this snapshot.
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_players: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_max_players: Option<i32>,
    pub logged_in_user: String,
    pub user_status: UserStatus,
    /// Name of the selected server, if any are configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_server: Option<String>,
    /// Server the profile page says the player is on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playing_on: Option<String>,
    pub seeding_enabled: bool,
    pub game_running: bool,
    pub coordinator: CoordinatorState,
    pub seed: ResultReason<SeedReason>,
    pub kick: ResultReason<KickReason>,
}

impl SeederStatus {
    pub fn snapshot(
        state: &SessionState,
        player: &PlayerStatus,
        game_running: bool,
        coordinator: CoordinatorState,
        seed: ResultReason<SeedReason>,
        kick: ResultReason<KickReason>,
    ) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            updated_at: chrono::Local::now().to_rfc3339(),
            current_players: state.current_players(),
            server_max_players: state.server_max_players(),
            logged_in_user: state.current_logged_in_user().to_string(),
            user_status: state.user_status(),
            current_server: state.servers().current().map(|s| s.name.clone()),
            playing_on: player.current_server_id.clone(),
            seeding_enabled: state.seeding_enabled(),
            game_running,
            coordinator,
            seed,
            kick,
        }
    }
}

/// Serializes `status` to TOML and writes it to `path`.
/// Creates the parent directory if it does not exist.
/// Failures are logged; a status write never stops the daemon.
pub fn write_status(path: &Path, status: &SeederStatus) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!("failed to create directory {}: {e}", parent.display());
            return;
        }
    }
    match toml::to_string_pretty(status) {
        Ok(content) => {
            if let Err(e) = std::fs::write(path, content) {
                warn!("failed to write status file: {e}");
            }
        }
        Err(e) => warn!("failed to serialize status: {e}"),
    }
}
