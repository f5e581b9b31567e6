//! Application state shared across handlers.

use crate::coordinator::Coordinator;
use std::sync::Arc;
use strata_core::config::CoordinatorConfig;

/// Coordinator service state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CoordinatorConfig>,
    pub coordinator: Arc<Coordinator>,
}

impl AppState {
    pub fn new(config: CoordinatorConfig, coordinator: Arc<Coordinator>) -> Self {
        Self {
            config: Arc::new(config),
            coordinator,
        }
    }
}
