//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::PawsConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The pool is created at startup and closed on
/// graceful shutdown by the binary.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PawsConfig,
    pool: PgPool,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: PawsConfig, pool: PgPool) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, pool }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &PawsConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }
}
