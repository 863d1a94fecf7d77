// Application state module
// Shared by every connection task

use super::types::Config;
use crate::store::ConfigStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: ConfigStore,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            store: ConfigStore::new(config.store.path.clone()),
            config: config.clone(),
        }
    }
}
