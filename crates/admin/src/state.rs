//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::media::BlobStoreClient;
use crate::services::EditorSessions;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; gives handlers access to configuration, the
/// database pool, the object store client, and the open gallery editing
/// sessions.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    blob: BlobStoreClient,
    editors: EditorSessions,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        let blob = BlobStoreClient::new(config.blob());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                blob,
                editors: EditorSessions::new(),
            }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the object store client.
    #[must_use]
    pub fn blob(&self) -> &BlobStoreClient {
        &self.inner.blob
    }

    /// Get a reference to the gallery editing session registry.
    #[must_use]
    pub fn editors(&self) -> &EditorSessions {
        &self.inner.editors
    }
}
