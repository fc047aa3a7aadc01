//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the process-wide collaborator handles, each built once at startup:
//! the content backend, the auth provider, and the media store. Any of them
//! may be absent; handlers report that instead of failing the process.

use std::sync::Arc;

use crate::services::auth::AuthProvider;
use crate::services::media::MediaStore;
use crate::store::{Backend, OrderedRecordStore, OrderedResource, ReorderRetry, SettingsStore};

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    /// Content backend. `None` if no database is configured.
    pub backend: Option<Arc<dyn Backend>>,
    /// Admin auth provider. `None` if auth env vars are not configured.
    pub auth: Option<Arc<dyn AuthProvider>>,
    /// Gallery upload target. `None` if media env vars are not configured.
    pub media: Option<Arc<MediaStore>>,
    pub reorder_retry: ReorderRetry,
    pub cookie_secure: bool,
}

impl AppState {
    #[must_use]
    pub fn new(
        backend: Option<Arc<dyn Backend>>,
        auth: Option<Arc<dyn AuthProvider>>,
        media: Option<Arc<MediaStore>>,
    ) -> Self {
        Self { backend, auth, media, reorder_retry: ReorderRetry::default(), cookie_secure: false }
    }

    #[must_use]
    pub fn with_reorder_retry(mut self, retry: ReorderRetry) -> Self {
        self.reorder_retry = retry;
        self
    }

    #[must_use]
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// Store for one ordered resource over the shared backend.
    #[must_use]
    pub fn records<T: OrderedResource>(&self) -> OrderedRecordStore<T> {
        OrderedRecordStore::new(self.backend.clone(), self.reorder_retry)
    }

    /// Settings editor resuming with the id the client holds.
    #[must_use]
    pub fn settings(&self, held_id: Option<uuid::Uuid>) -> SettingsStore {
        SettingsStore::with_held_id(self.backend.clone(), held_id)
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
