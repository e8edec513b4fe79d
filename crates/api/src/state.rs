use std::sync::Arc;

use stockroom_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;

/// Handler state. Cloned per request; every field is a handle.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<ServerConfig>,
    /// Fires when shutdown begins. Imports take a child token and stop
    /// between rows; `/health` reports `draining`.
    pub shutdown: CancellationToken,
}
