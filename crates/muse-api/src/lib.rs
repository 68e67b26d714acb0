pub mod auth;
pub mod content;
pub mod convert;
pub mod error;
pub mod favorites;
pub mod middleware;
pub mod notifications;
pub mod routes;

use std::sync::Arc;

use muse_db::Database;
use tracing::error;

use crate::error::ApiError;

pub use routes::router;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    /// `None` disables `/admin/init`.
    pub admin_init_secret: Option<String>,
}

/// Run blocking DB work off the async runtime.
pub(crate) async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || f(&db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Storage(anyhow::anyhow!("blocking task failed: {}", e))
        })?
        .map_err(ApiError::Storage)
}
