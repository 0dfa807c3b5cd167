pub mod api;
pub mod controller;
pub mod credentials;
pub mod fetcher;
pub mod poller;
pub mod request;

#[cfg(test)]
pub(crate) mod testing;

use crate::{
    classifier::ClassifiedError,
    config::ClientConfig,
    models::{Configuration, MaterializedResult},
    storage::SettingsStore,
};
use std::sync::Arc;

pub use api::{HttpJobApi, JobApi, Payload};
pub use controller::{GenerationController, GenerationObserver, GenerationState, LoggingObserver};
pub use credentials::{CredentialProvider, EnvCredentials, StaticCredential};
pub use fetcher::{file_stem_for_prompt, ResultFetcher};
pub use poller::{Clock, PollLoop, TokioClock};
pub use request::RequestBuilder;

/// Generation controller and settings store wired from one [`ClientConfig`].
pub struct VeoClient {
    controller: GenerationController,
    settings: SettingsStore,
}

impl VeoClient {
    pub fn new(config: ClientConfig) -> Self {
        let credentials: Arc<dyn CredentialProvider> = match &config.api_key {
            Some(key) => Arc::new(StaticCredential::new(Some(key.clone()))),
            None => Arc::new(EnvCredentials),
        };
        let api: Arc<dyn JobApi> = Arc::new(HttpJobApi::from_config(&config));

        let controller = GenerationController::new(api, credentials)
            .with_model(config.model.clone())
            .with_poll_policy(config.poll);

        log::info!(
            "Video client ready: model {}, up to {} status checks every {:?}",
            config.model,
            config.poll.max_attempts,
            config.poll.interval
        );

        Self {
            controller,
            settings: SettingsStore::from_config(&config),
        }
    }

    pub fn from_parts(controller: GenerationController, settings: SettingsStore) -> Self {
        Self {
            controller,
            settings,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn GenerationObserver>) -> Self {
        self.controller = self.controller.with_observer(observer);
        self
    }

    pub fn controller(&self) -> &GenerationController {
        &self.controller
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// The configuration to start the session with.
    pub async fn restore_configuration(&self) -> Configuration {
        self.settings.load_or_default().await
    }

    /// Persist an edit. Does not affect a generation already submitted.
    pub async fn update_configuration(&self, config: &Configuration) {
        self.settings.save(config).await;
    }

    pub async fn generate(
        &self,
        config: &Configuration,
    ) -> std::result::Result<Vec<MaterializedResult>, ClassifiedError> {
        self.controller.generate(config).await
    }
}
