/// Live state of the single seeding session.
///
/// One `SessionState` is built at startup from the settings and owned by the
/// control loop, which is the only writer. Every setter publishes a
/// [`ContextEvent::PropertyChanged`] when (and only when) the value changed.
use serde::Serialize;

use crate::config::Config;
use crate::event::{ContextEvent, Notifier, Property};
use crate::servers::ServerList;

/// Logged-in user value used when nobody is signed in to the page.
pub const NOT_LOGGED_IN: &str = "Not Logged In";

/// How the signed-in account compares to the configured seeder account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Correct,
    Incorrect,
    /// Nobody is logged in.
    None,
}

#[derive(Debug)]
pub struct SessionState {
    current_players: Option<i32>,
    server_max_players: Option<i32>,
    hang_protection_enabled: Option<bool>,
    seeding_enabled: bool,
    current_logged_in_user: String,
    username: String,
    servers: ServerList,
    notifier: Notifier,
}

impl SessionState {
    pub fn from_config(config: &Config) -> Self {
        let notifier = Notifier::new();
        let servers = ServerList::new(
            config.servers.clone(),
            config.global.current_server_index,
            notifier.clone(),
        );
        Self {
            current_players: None,
            server_max_players: None,
            hang_protection_enabled: config.global.hang_protection_enabled,
            seeding_enabled: config.global.seeding_enabled,
            current_logged_in_user: NOT_LOGGED_IN.to_string(),
            username: config.global.username.clone(),
            servers,
            notifier,
        }
    }

    /// Re-applies user settings after a config reload. Observed facts
    /// (player counts, logged-in user) are left untouched.
    pub fn apply_config(&mut self, config: &Config) {
        self.set_username(config.global.username.clone());
        self.set_seeding_enabled(config.global.seeding_enabled);
        self.set_hang_protection_enabled(config.global.hang_protection_enabled);
        self.servers.sync(config.servers.clone());
        self.servers.select(config.global.current_server_index);
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn current_players(&self) -> Option<i32> {
        self.current_players
    }

    pub fn server_max_players(&self) -> Option<i32> {
        self.server_max_players
    }

    /// Sets both counts from one parse attempt: `Some((current, max))` on a
    /// match, `None` to clear both.
    pub fn set_player_counts(&mut self, counts: Option<(i32, i32)>) {
        let (current, max) = match counts {
            Some((c, m)) => (Some(c), Some(m)),
            None => (None, None),
        };
        if self.current_players != current {
            self.current_players = current;
            self.changed(Property::CurrentPlayers);
        }
        if self.server_max_players != max {
            self.server_max_players = max;
            self.changed(Property::ServerMaxPlayers);
        }
    }

    pub fn hang_protection_enabled(&self) -> Option<bool> {
        self.hang_protection_enabled
    }

    pub fn set_hang_protection_enabled(&mut self, value: Option<bool>) {
        if self.hang_protection_enabled != value {
            self.hang_protection_enabled = value;
            self.changed(Property::HangProtectionEnabled);
        }
    }

    pub fn seeding_enabled(&self) -> bool {
        self.seeding_enabled
    }

    pub fn set_seeding_enabled(&mut self, value: bool) {
        if self.seeding_enabled != value {
            self.seeding_enabled = value;
            self.changed(Property::SeedingEnabled);
        }
    }

    pub fn current_logged_in_user(&self) -> &str {
        &self.current_logged_in_user
    }

    pub fn set_current_logged_in_user(&mut self, value: String) {
        if self.current_logged_in_user != value {
            self.current_logged_in_user = value;
            self.changed(Property::CurrentLoggedInUser);
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn set_username(&mut self, value: String) {
        if self.username != value {
            self.username = value;
            self.changed(Property::Username);
        }
    }

    pub fn servers(&self) -> &ServerList {
        &self.servers
    }

    pub fn servers_mut(&mut self) -> &mut ServerList {
        &mut self.servers
    }

    pub fn user_status(&self) -> UserStatus {
        if self.current_logged_in_user == NOT_LOGGED_IN {
            UserStatus::None
        } else if self.current_logged_in_user.to_lowercase() == self.username.to_lowercase() {
            UserStatus::Correct
        } else {
            UserStatus::Incorrect
        }
    }

    fn changed(&self, property: Property) {
        self.notifier.emit(ContextEvent::PropertyChanged(property));
    }
}
