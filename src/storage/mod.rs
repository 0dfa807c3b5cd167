pub mod file;
pub mod memory;
pub mod traits;

use crate::{config::ClientConfig, models::Configuration};
use std::sync::Arc;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::KeyValueStore;

pub const SETTINGS_STORAGE_KEY: &str = "veo-generation-settings";

/// Persists the last-used [`Configuration`] as a single JSON snapshot.
///
/// Neither operation surfaces errors: a failed save is logged, and anything
/// unreadable on load is treated as "no saved settings".
#[derive(Clone)]
pub struct SettingsStore {
    backend: Arc<dyn KeyValueStore>,
    key: String,
}

impl SettingsStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            key: SETTINGS_STORAGE_KEY.to_string(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// File-backed when the config names a settings directory, in-memory otherwise.
    pub fn from_config(config: &ClientConfig) -> Self {
        match &config.settings_dir {
            Some(dir) => Self::new(Arc::new(FileStore::new(dir.clone()))),
            None => {
                log::warn!("No settings directory configured, settings will not survive restarts");
                Self::in_memory()
            }
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }

    pub async fn save(&self, config: &Configuration) {
        let snapshot = match serde_json::to_string(config) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::error!("Failed to serialize settings: {}", e);
                return;
            }
        };

        match self.backend.set(&self.key, &snapshot).await {
            Ok(()) => log::debug!("Saved settings ({} bytes)", snapshot.len()),
            Err(e) => log::error!("Failed to save settings: {}", e),
        }
    }

    pub async fn load(&self) -> Option<Configuration> {
        let raw = match self.backend.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log::error!("Failed to read saved settings: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<Configuration>(&raw) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to parse saved settings, using defaults: {}", e);
                if let Err(e) = self.backend.remove(&self.key).await {
                    log::error!("Failed to clear corrupted settings: {}", e);
                }
                None
            }
        }
    }

    /// Restores the saved configuration, or persists and returns the defaults.
    pub async fn load_or_default(&self) -> Configuration {
        if let Some(config) = self.load().await {
            log::info!("Restored saved settings");
            return config;
        }

        let config = Configuration::default();
        self.save(&config).await;
        config
    }
}
