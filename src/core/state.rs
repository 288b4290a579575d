use std::sync::Arc;

use sqlx::PgPool;

use crate::core::config::Settings;
use crate::services::storage::StorageService;

/// Shared handles for the request handlers. The pool is constructed once at
/// startup and injected here; nothing in the crate reaches for a global
/// connection.
#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    storage: StorageService,
}

impl AppState {
    pub(crate) fn new(settings: Settings, db: PgPool, storage: StorageService) -> Self {
        Self { inner: Arc::new(InnerState { settings, db, storage }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn storage(&self) -> &StorageService {
        &self.inner.storage
    }
}
