/// The refresh cycle: page → extractors → profile → hang protection →
/// decisions → join → status snapshot.
///
/// A failed fetch leaves the previous facts in place until the next cycle.
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::coordinator::JoinCoordinator;
use crate::decision;
use crate::page_source::PageSource;
use crate::pipeline::UpdatePipeline;
use crate::process_watcher::{GameControl, GameProcess, GameSnapshot};
use crate::profile::{PlayerStatus, ProfileClient};
use crate::session::SessionState;
use crate::status::SeederStatus;

/// Everything the refresh cycle reads or writes.
pub struct Seeder {
    session: SessionState,
    pipeline: UpdatePipeline,
    game: Arc<dyn GameControl>,
    coordinator: JoinCoordinator,
    player: PlayerStatus,
}

impl Seeder {
    pub fn new(
        session: SessionState,
        pipeline: UpdatePipeline,
        game: Arc<dyn GameControl>,
        coordinator: JoinCoordinator,
    ) -> Self {
        Self {
            session,
            pipeline,
            game,
            coordinator,
            player: PlayerStatus::unknown(),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn coordinator(&self) -> &JoinCoordinator {
        &self.coordinator
    }

    pub fn apply_config(&mut self, config: &Config) {
        self.session.apply_config(config);
        self.coordinator.set_auto_minimize(config.global.auto_minimize);
    }

    /// One full poll. The caller decides what to do with the snapshot.
    pub async fn refresh(&mut self, pages: &PageSource, profile: &ProfileClient) -> SeederStatus {
        if let Some(server) = self.session.servers().current().cloned() {
            match pages.fetch(&server.address).await {
                Ok(page) => self.observe_page(&page),
                Err(e) => warn!("refresh of {} failed: {e}", server.name),
            }
        } else {
            debug!("no server configured; skipping page fetch");
        }

        self.player = profile
            .player_status(self.session.current_logged_in_user())
            .await;

        self.evaluate()
    }

    /// Runs the extractors over a freshly fetched page.
    pub fn observe_page(&mut self, page: &str) {
        self.pipeline.update_status(&mut self.session, page);
    }

    /// Acts on the current facts: stops a hung game when protection is on,
    /// then decides and schedules a join. Returns the resulting status.
    pub fn evaluate(&mut self) -> SeederStatus {
        self.protect_against_hang();

        let game = GameSnapshot { running: self.game.is_game_running() };
        let seed = decision::should_seed(&self.session, &game);
        let kick = decision::should_kick(&self.session, &game);
        debug!(?seed, ?kick, "decisions evaluated");

        if seed.result {
            if let Some(server) = self.session.servers().current() {
                info!(server = %server.name, players = ?self.session.current_players(), "seeding");
            }
            self.coordinator.join_server();
        }

        SeederStatus::snapshot(
            &self.session,
            &self.player,
            game.is_game_running(),
            self.coordinator.state(),
            seed,
            kick,
        )
    }

    /// Only an explicit `Some(true)` enables protection.
    fn protect_against_hang(&self) -> bool {
        if self.session.hang_protection_enabled() != Some(true) || !self.game.is_game_hung() {
            return false;
        }
        warn!("game is not responding; stopping it");
        self.game.stop_game()
    }
}
