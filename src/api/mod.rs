pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::ml::{BatchAnalyzer, ModelLifecycleManager, TicketAnalyzer};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<TicketAnalyzer>,
    pub batch: Arc<BatchAnalyzer>,
    pub lifecycle: Arc<ModelLifecycleManager>,
}

impl AppState {
    pub fn new(
        analyzer: Arc<TicketAnalyzer>,
        batch: Arc<BatchAnalyzer>,
        lifecycle: Arc<ModelLifecycleManager>,
    ) -> Self {
        Self {
            analyzer,
            batch,
            lifecycle,
        }
    }
}
