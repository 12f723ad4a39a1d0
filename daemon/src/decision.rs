/// Seed/kick decisions over the current session state.
///
/// Both queries are read-only. Rules are checked in a fixed order and the first
/// one that fires is the reason returned.
use serde::Serialize;

use crate::process_watcher::GameProcess;
use crate::result_reason::ResultReason;
use crate::session::{SessionState, UserStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SeedReason {
    NoServerDefined,
    SeedingDisabled,
    NotLoggedIn,
    IncorrectUser,
    GameAlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KickReason {
    GameNotRunning,
    NoServerDefined,
}

pub fn should_seed(state: &SessionState, game: &dyn GameProcess) -> ResultReason<SeedReason> {
    if state.servers().is_empty() {
        return ResultReason::no(SeedReason::NoServerDefined);
    }
    if !state.seeding_enabled() {
        return ResultReason::no(SeedReason::SeedingDisabled);
    }
    match state.user_status() {
        UserStatus::None => return ResultReason::no(SeedReason::NotLoggedIn),
        UserStatus::Incorrect => return ResultReason::no(SeedReason::IncorrectUser),
        UserStatus::Correct => {}
    }
    if game.is_game_running() {
        return ResultReason::no(SeedReason::GameAlreadyRunning);
    }
    ResultReason::yes()
}

/// Never answers "kick" at present: leaving a server once its population passes
/// the seeding threshold is not an active rule, so every path ends negative.
pub fn should_kick(state: &SessionState, game: &dyn GameProcess) -> ResultReason<KickReason> {
    if !game.is_game_running() {
        return ResultReason::no(KickReason::GameNotRunning);
    }
    if state.servers().is_empty() {
        return ResultReason::no(KickReason::NoServerDefined);
    }
    ResultReason::no_reason()
}
