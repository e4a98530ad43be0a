//! Shared handler state

use crate::config::ServerConfig;
use rentbook_core::{Directory, Engine, ListParams, Registry};
use rentbook_storage::Store;
use std::sync::Arc;
use std::time::Instant;

/// Page size bounds applied to every list endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default: usize,
    pub max: usize,
}

impl PageLimits {
    pub fn params(&self, skip: Option<usize>, limit: Option<usize>) -> ListParams {
        ListParams::new(skip.unwrap_or(0), limit.unwrap_or(self.default)).capped(self.max)
    }
}

/// Services shared by all handlers
pub struct AppState<S> {
    pub store: Arc<S>,
    pub engine: Engine<S>,
    pub registry: Registry<S>,
    pub directory: Directory<S>,
    pub pages: PageLimits,
    pub started: Instant,
}

impl<S: Store> AppState<S> {
    pub fn new(store: Arc<S>, config: &ServerConfig) -> Self {
        Self {
            engine: Engine::new(store.clone()),
            registry: Registry::new(store.clone()),
            directory: Directory::new(store.clone()),
            store,
            pages: PageLimits {
                default: config.default_page_limit,
                max: config.max_page_limit,
            },
            started: Instant::now(),
        }
    }
}
