/// Update pipeline: runs every registered extractor over one page snapshot.
///
/// The pipeline is the single designated writer of observed facts. It is driven
/// from the control loop once per refresh:
///   page text → extractors → session mutations → one `StatusUpdated` event
use tracing::debug;

use crate::event::ContextEvent;
use crate::extract::{ContextUpdater, LoggedInUserUpdater, PlayerCountsUpdater};
use crate::session::SessionState;

pub struct UpdatePipeline {
    updaters: Vec<Box<dyn ContextUpdater>>,
}

impl UpdatePipeline {
    pub fn new(updaters: Vec<Box<dyn ContextUpdater>>) -> Self {
        Self { updaters }
    }

    /// The extractors the daemon ships with.
    pub fn with_default_updaters() -> Self {
        Self::new(vec![Box::new(PlayerCountsUpdater), Box::new(LoggedInUserUpdater)])
    }

    /// Applies each extractor, in registration order, to the same `page`, then
    /// publishes exactly one [`ContextEvent::StatusUpdated`].
    pub fn update_status(&self, state: &mut SessionState, page: &str) {
        for updater in &self.updaters {
            debug!(updater = updater.name(), "running extractor");
            updater.update_context(state, page);
        }
        state.notifier().emit(ContextEvent::StatusUpdated);
    }
}
