use std::sync::{Arc, Mutex};

use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use crate::event::SeederEvent;
use crate::window;

const POLL_INTERVAL_SECS: u64 = 2;

/// Answers whether the game is running. Implemented by [`ProcessWatcher`];
/// the decision engine only depends on this trait.
pub trait GameProcess: Send + Sync {
    fn is_game_running(&self) -> bool;
}

/// Recovery actions on the running game, used by hang protection.
pub trait GameControl: GameProcess {
    /// True if the running game's window is reported as not responding.
    fn is_game_hung(&self) -> bool;

    /// Requests termination of the game. Returns whether a kill was issued.
    fn stop_game(&self) -> bool;
}

/// One observation of whether the game is running, so a set of decisions made
/// together all see the same answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSnapshot {
    pub running: bool,
}

impl GameProcess for GameSnapshot {
    fn is_game_running(&self) -> bool {
        self.running
    }
}

/// A running instance of the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameInstance {
    pub pid: u32,
    pub name: String,
}

struct Inner {
    sys: System,
    /// Lowercased executable name.
    process_name: String,
}

/// Finds the game process by executable name (case-insensitive).
///
/// When several instances are running, the one with the lowest pid is treated
/// as "the" game; the others are ignored by [`ProcessWatcher::stop_game`] and
/// [`ProcessWatcher::current_game`].
pub struct ProcessWatcher {
    inner: Mutex<Inner>,
}

impl ProcessWatcher {
    pub fn new(process_name: &str) -> Self {
        Self {
            inner: Mutex::new(Inner {
                sys: System::new(),
                process_name: process_name.to_lowercase(),
            }),
        }
    }

    pub fn set_process_name(&self, process_name: &str) {
        self.lock().process_name = process_name.to_lowercase();
    }

    /// Refreshes the process table and returns the matching instances, lowest pid first.
    pub fn instances(&self) -> Vec<GameInstance> {
        let mut inner = self.lock();
        inner.sys.refresh_processes(ProcessesToUpdate::All, true);
        let mut found: Vec<GameInstance> = inner
            .sys
            .processes()
            .values()
            .filter(|p| p.name().to_string_lossy().to_lowercase() == inner.process_name)
            .map(|p| GameInstance {
                pid: p.pid().as_u32(),
                name: p.name().to_string_lossy().into_owned(),
            })
            .collect();
        found.sort_by_key(|g| g.pid);
        found
    }

    pub fn current_game(&self) -> Option<GameInstance> {
        self.instances().into_iter().next()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl GameProcess for ProcessWatcher {
    fn is_game_running(&self) -> bool {
        !self.instances().is_empty()
    }
}

impl GameControl for ProcessWatcher {
    /// Requests termination of the first running instance. No-op when the game
    /// is not running. Returns whether a kill was issued successfully.
    fn stop_game(&self) -> bool {
        let Some(game) = self.current_game() else {
            debug!("stop requested but game is not running");
            return false;
        };
        let inner = self.lock();
        match inner.sys.process(Pid::from_u32(game.pid)) {
            Some(process) => {
                let killed = process.kill();
                if killed {
                    info!(pid = game.pid, "terminated {}", game.name);
                } else {
                    warn!(pid = game.pid, "failed to terminate {}", game.name);
                }
                killed
            }
            None => false,
        }
    }

    /// True if the running game's window is reported as not responding.
    fn is_game_hung(&self) -> bool {
        self.current_game()
            .map(|g| window::is_process_hung(g.pid))
            .unwrap_or(false)
    }
}

/// Polls the OS process list every [`POLL_INTERVAL_SECS`] seconds and emits
/// [`SeederEvent::GameStarted`] / [`SeederEvent::GameStopped`] whenever the game
/// appears or disappears.
pub async fn run(watcher: Arc<ProcessWatcher>, tx: mpsc::Sender<SeederEvent>) {
    let mut running = false;
    let mut ticker = interval(Duration::from_secs(POLL_INTERVAL_SECS));

    loop {
        ticker.tick().await;

        let now_running = watcher.is_game_running();
        let event = match (running, now_running) {
            (false, true) => SeederEvent::GameStarted,
            (true, false) => SeederEvent::GameStopped,
            _ => continue,
        };
        running = now_running;
        if tx.send(event).await.is_err() {
            break;
        }
    }
}
