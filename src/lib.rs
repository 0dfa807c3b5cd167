pub mod classifier;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod storage;
pub mod veo;

pub use classifier::{ClassifiedError, ErrorCategory, ErrorClassifier, MessageClassifier};
pub use config::{ClientConfig, PollPolicy};
pub use error::{Result, VeoError};
pub use models::*;
pub use storage::{FileStore, KeyValueStore, MemoryStore, SettingsStore};
pub use veo::{
    CredentialProvider, GenerationController, GenerationObserver, GenerationState, HttpJobApi,
    JobApi, VeoClient,
};
