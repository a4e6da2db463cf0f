//! Shared service state.

use std::sync::Arc;

use crate::board::EventBoard;
use crate::config::{BoardConfig, ServiceConfig};
use crate::store::ObjectStore;

/// State shared by every request handler.
///
/// Cloning is cheap; the board and configuration sit behind `Arc`s.
pub struct ServiceState<S: ObjectStore + 'static> {
    /// Board operations over the configured store.
    pub board: Arc<EventBoard<S>>,
    /// HTTP-level settings.
    pub config: Arc<ServiceConfig>,
}

impl<S: ObjectStore + 'static> ServiceState<S> {
    /// Create state from a store and both configurations.
    pub fn new(store: S, board_config: BoardConfig, config: ServiceConfig) -> Self {
        Self {
            board: Arc::new(EventBoard::new(store, board_config)),
            config: Arc::new(config),
        }
    }

    /// Largest request body accepted by the upload routes.
    pub fn upload_body_limit(&self) -> usize {
        self.board
            .config()
            .upload_max_bytes
            .saturating_mul(super::routes::MAX_UPLOAD_PARTS)
            .saturating_add(64 * 1024)
    }
}

impl<S: ObjectStore + 'static> Clone for ServiceState<S> {
    fn clone(&self) -> Self {
        Self {
            board: Arc::clone(&self.board),
            config: Arc::clone(&self.config),
        }
    }
}
