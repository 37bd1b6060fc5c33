//! Application state shared across handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::ApiConfig;
use crate::error::AppError;
use crate::store::{DocumentStore, StoreHandle};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration and the document store slot.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: StoreHandle,
    started_at: Instant,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `store` - Store slot, possibly still waiting for its connection
    #[must_use]
    pub fn new(config: ApiConfig, store: StoreHandle) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                started_at: Instant::now(),
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the store slot.
    #[must_use]
    pub fn store_handle(&self) -> &StoreHandle {
        &self.inner.store
    }

    /// Get the connected document store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::StorageUnavailable` until the connection succeeds.
    pub fn store(&self) -> Result<&Arc<dyn DocumentStore>, AppError> {
        self.inner
            .store
            .get()
            .ok_or(AppError::StorageUnavailable)
    }

    /// Time since the state was created.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }
}
