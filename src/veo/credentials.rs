use std::env;
use std::sync::RwLock;

use async_trait::async_trait;

pub const CREDENTIAL_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

/// Host-side source of the API credential.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// The current credential, if one is configured.
    async fn credential(&self) -> Option<String>;

    /// Ask the host to let the user pick a new credential.
    async fn request_credential(&self);
}

/// Reads the key from the environment on every call, so a key exported
/// after a failure is picked up by the next attempt.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials;

#[async_trait]
impl CredentialProvider for EnvCredentials {
    async fn credential(&self) -> Option<String> {
        CREDENTIAL_ENV_VARS
            .iter()
            .filter_map(|name| env::var(name).ok())
            .find(|value| !value.trim().is_empty())
    }

    async fn request_credential(&self) {
        log::error!(
            "API key selection is not available. Please configure the {} environment variable.",
            CREDENTIAL_ENV_VARS[0]
        );
    }
}

/// A credential set in code, replaceable at runtime.
#[derive(Debug, Default)]
pub struct StaticCredential {
    key: RwLock<Option<String>>,
}

impl StaticCredential {
    pub fn new(key: Option<String>) -> Self {
        Self {
            key: RwLock::new(key.filter(|k| !k.trim().is_empty())),
        }
    }

    pub fn set(&self, key: impl Into<String>) {
        if let Ok(mut guard) = self.key.write() {
            *guard = Some(key.into());
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredential {
    async fn credential(&self) -> Option<String> {
        self.key.read().ok().and_then(|guard| guard.clone())
    }

    async fn request_credential(&self) {
        log::warn!("Credential rejected or missing; call StaticCredential::set with a new key");
    }
}
