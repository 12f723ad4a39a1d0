/// Join/minimize coordinator.
///
/// Joining a server hands focus to the game, so after a join the daemon pushes
/// the game window back down. That work happens on a background task with a
/// fixed budget:
///
///   Idle ──join_server()──▶ Minimizing ──done / failed / budget elapsed──▶ Idle
///
/// A minimizer that ignores cancellation is aborted [`CANCEL_GRACE`] after the
/// token fires, so the coordinator is back to Idle shortly after the budget.
/// `join_server` never waits for the task and never sees its errors.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::process_watcher::GameInstance;
use crate::window;

/// How long a minimize attempt may run before it is cancelled.
pub const MINIMIZE_BUDGET: Duration = Duration::from_secs(300);

/// How long a cancelled minimize gets to wind down before its task is aborted.
const CANCEL_GRACE: Duration = Duration::from_secs(5);

/// Delay between looks for the game window while it has not appeared yet.
const WINDOW_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Reads the running game at the moment it is called.
pub type GameAccessor = Arc<dyn Fn() -> Option<GameInstance> + Send + Sync>;

#[derive(Debug, Error)]
pub enum MinimizeError {
    #[error("minimize cancelled before the game window was found")]
    Cancelled,
    #[error("window minimizing is not supported on this platform")]
    Unsupported,
    #[error("{0}")]
    Failed(String),
}

/// Performs the actual minimize. Must return promptly once `cancel` fires.
#[async_trait]
pub trait Minimizer: Send + Sync {
    async fn minimize(
        &self,
        current_game: GameAccessor,
        cancel: CancellationToken,
    ) -> Result<(), MinimizeError>;
}

/// Waits for the game's window to show up and minimizes it.
pub struct WindowMinimizer;

#[async_trait]
impl Minimizer for WindowMinimizer {
    async fn minimize(
        &self,
        current_game: GameAccessor,
        cancel: CancellationToken,
    ) -> Result<(), MinimizeError> {
        if !window::SUPPORTED {
            return Err(MinimizeError::Unsupported);
        }
        loop {
            if let Some(game) = current_game() {
                let count = window::minimize_process_windows(game.pid);
                if count > 0 {
                    debug!(pid = game.pid, windows = count, "minimized game");
                    return Ok(());
                }
            }
            tokio::select! {
                _ = cancel.cancelled() => return Err(MinimizeError::Cancelled),
                _ = sleep(WINDOW_POLL_INTERVAL) => {}
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinatorState {
    Idle,
    Minimizing,
}

pub struct JoinCoordinator {
    minimizer: Arc<dyn Minimizer>,
    current_game: GameAccessor,
    auto_minimize: AtomicBool,
    budget: Duration,
    state: Arc<Mutex<CoordinatorState>>,
    /// Cancellation handle of the in-flight minimize, if any.
    active: Arc<Mutex<Option<CancellationToken>>>,
}

impl JoinCoordinator {
    pub fn new(
        minimizer: Arc<dyn Minimizer>,
        current_game: GameAccessor,
        auto_minimize: bool,
    ) -> Self {
        Self {
            minimizer,
            current_game,
            auto_minimize: AtomicBool::new(auto_minimize),
            budget: MINIMIZE_BUDGET,
            state: Arc::new(Mutex::new(CoordinatorState::Idle)),
            active: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set_auto_minimize(&self, enabled: bool) {
        self.auto_minimize.store(enabled, Ordering::Relaxed);
    }

    pub fn state(&self) -> CoordinatorState {
        *lock(&self.state)
    }

    /// Schedules the post-join minimize and returns immediately.
    ///
    /// Returns whether a minimize was scheduled: `false` when auto-minimize is
    /// off or one is already in flight.
    pub fn join_server(&self) -> bool {
        if !self.auto_minimize.load(Ordering::Relaxed) {
            debug!("auto-minimize disabled; nothing to do after join");
            return false;
        }
        {
            let mut state = lock(&self.state);
            if *state == CoordinatorState::Minimizing {
                debug!("minimize already in progress");
                return false;
            }
            *state = CoordinatorState::Minimizing;
        }

        let token = CancellationToken::new();
        *lock(&self.active) = Some(token.clone());

        let timer = {
            let token = token.clone();
            let budget = self.budget;
            tokio::spawn(async move {
                sleep(budget).await;
                token.cancel();
            })
        };

        let minimizer = Arc::clone(&self.minimizer);
        let current_game = Arc::clone(&self.current_game);
        let state = Arc::clone(&self.state);
        let active = Arc::clone(&self.active);
        let cancelled = token.clone();
        tokio::spawn(async move {
            // Run the action on its own task so a panic inside it is contained here.
            let mut attempt =
                tokio::spawn(async move { minimizer.minimize(current_game, token).await });
            let abandoned = async {
                cancelled.cancelled().await;
                sleep(CANCEL_GRACE).await;
            };
            tokio::select! {
                outcome = &mut attempt => match outcome {
                    Ok(Ok(())) => info!("game minimized after join"),
                    Ok(Err(e)) => warn!("minimize after join abandoned: {e}"),
                    Err(e) => warn!("minimize task failed: {e}"),
                },
                _ = abandoned => {
                    attempt.abort();
                    warn!("minimize did not stop when cancelled; aborted");
                }
            }
            timer.abort();
            *lock(&active) = None;
            *lock(&state) = CoordinatorState::Idle;
        });
        true
    }

    /// Cancels an in-flight minimize without waiting for it to wind down.
    pub fn cancel(&self) {
        if let Some(token) = lock(&self.active).take() {
            token.cancel();
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
