use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::ScoringQueue;
use crate::store::IntakeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn IntakeStore>,
    /// Sending half of the background scoring queue. The worker pool shuts
    /// down once every clone of it is gone.
    pub queue: ScoringQueue,
    pub config: Config,
}
