use tokio::sync::broadcast;

use crate::config::Config;

/// Messages driving the daemon's main event loop.
pub enum SeederEvent {
    /// The watched game process appeared in the process list.
    GameStarted,
    /// The watched game process exited.
    GameStopped,
    /// The config file changed on disk and was successfully re-parsed.
    ConfigReloaded(Config),
    /// The refresh interval elapsed; fetch the selected server page and re-evaluate.
    RefreshRequested,
    /// Ctrl+C received; the daemon should write its final status and exit.
    Shutdown,
}

/// Observable session fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    CurrentPlayers,
    ServerMaxPlayers,
    HangProtectionEnabled,
    SeedingEnabled,
    CurrentLoggedInUser,
    Username,
}

/// Membership or content change of the server list. Indices refer to the list
/// as it was right after the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerChange {
    Added(usize),
    Removed(usize),
    Updated(usize),
    Selected(usize),
}

/// Change notifications published to subscribers of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextEvent {
    /// A single session field took a new value.
    PropertyChanged(Property),
    /// The server list or one of its entries changed.
    ServerChanged(ServerChange),
    /// One `UpdateStatus` pass finished running every extractor.
    StatusUpdated,
}

const NOTIFY_CAPACITY: usize = 64;

/// Publish side of the session's change feed.
///
/// Cloning shares the same channel, so the session and its server list publish
/// into one stream. Emitting with no live subscribers is not an error.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<ContextEvent>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self { tx }
    }

    pub fn emit(&self, event: ContextEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ContextEvent> {
        self.tx.subscribe()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
