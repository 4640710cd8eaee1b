//! Application state shared across handlers.

use std::sync::Arc;

use loosenotes_service::NoteAccessService;

use crate::config::ServerConfig;

/// Application state shared across all handlers.
///
/// Cloneable; handlers extract it with `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    service: Arc<NoteAccessService>,
    config: Arc<ServerConfig>,
}

impl AppState {
    /// Create new application state.
    pub fn new(service: NoteAccessService, config: ServerConfig) -> Self {
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
        }
    }

    /// The note access service every route delegates to.
    pub fn service(&self) -> &NoteAccessService {
        &self.service
    }

    /// Get a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
