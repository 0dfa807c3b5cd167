//! Failure classification.
//!
//! Maps any [`VeoError`] onto a closed set of categories, each with one
//! user-facing message and a flag saying whether the host should ask for a
//! new credential. The job API only reports human-readable text, so the
//! credential checks are substring matches; callers only see
//! [`ErrorClassifier`] and never depend on the matching rules.

use crate::error::VeoError;
use serde::Serialize;
use thiserror::Error;

const NOT_FOUND_MARKERS: &[&str] = &["Requested entity was not found."];
const INVALID_KEY_MARKERS: &[&str] = &["API_KEY_INVALID", "API key not valid"];
const PERMISSION_DENIED_MARKER: &str = "permission denied";

pub const MODEL_NOT_FOUND_MESSAGE: &str = "Model not found. This can be caused by an invalid API key or permission issues. Please check your API key.";
pub const INVALID_KEY_MESSAGE: &str = "Your API key is invalid. Please add a valid API key.";
pub const MISSING_KEY_MESSAGE: &str = "API key is not configured. Please add your API key.";
pub const TIMEOUT_MESSAGE: &str =
    "Video generation timed out. Please try again with a simpler prompt.";
pub const EMPTY_RESULT_MESSAGE: &str =
    "No videos were generated. The prompt may have been blocked.";
pub const EMPTY_PROMPT_MESSAGE: &str = "Please enter a prompt to generate a video.";
pub const BUSY_MESSAGE: &str = "A video is already being generated. Please wait for it to finish.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    ValidationError,
    TransportError,
    Timeout,
    EmptyResult,
    InvalidCredential,
    InvalidConfiguration,
    Busy,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::ValidationError => "validation_error",
            ErrorCategory::TransportError => "transport_error",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::EmptyResult => "empty_result",
            ErrorCategory::InvalidCredential => "invalid_credential",
            ErrorCategory::InvalidConfiguration => "invalid_configuration",
            ErrorCategory::Busy => "busy",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

/// The only error type handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct ClassifiedError {
    pub category: ErrorCategory,
    pub message: String,
    pub requires_credential_prompt: bool,
}

impl ClassifiedError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            requires_credential_prompt: false,
        }
    }

    fn with_credential_prompt(mut self) -> Self {
        self.requires_credential_prompt = true;
        self
    }
}

pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, cause: &VeoError) -> ClassifiedError;
}

/// Classifies by matching the error text.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageClassifier;

impl ErrorClassifier for MessageClassifier {
    fn classify(&self, cause: &VeoError) -> ClassifiedError {
        classify(cause)
    }
}

/// The text a cause carries, without the variant prefix of its `Display`.
fn cause_text(cause: &VeoError) -> String {
    match cause {
        VeoError::ApiError { message, .. } => message.clone(),
        VeoError::ValidationError(msg)
        | VeoError::RequestError(msg)
        | VeoError::ResponseError(msg)
        | VeoError::JobFailed(msg)
        | VeoError::StorageError(msg) => msg.clone(),
        other => other.to_string(),
    }
}

pub fn classify(cause: &VeoError) -> ClassifiedError {
    let text = cause_text(cause);

    if NOT_FOUND_MARKERS.iter().any(|m| text.contains(m)) {
        return ClassifiedError::new(ErrorCategory::InvalidConfiguration, MODEL_NOT_FOUND_MESSAGE)
            .with_credential_prompt();
    }

    if INVALID_KEY_MARKERS.iter().any(|m| text.contains(m))
        || text.to_lowercase().contains(PERMISSION_DENIED_MARKER)
    {
        return ClassifiedError::new(ErrorCategory::InvalidCredential, INVALID_KEY_MESSAGE)
            .with_credential_prompt();
    }

    match cause {
        VeoError::Timeout { .. } => ClassifiedError::new(ErrorCategory::Timeout, TIMEOUT_MESSAGE),
        VeoError::EmptyResult => {
            ClassifiedError::new(ErrorCategory::EmptyResult, EMPTY_RESULT_MESSAGE)
        }
        VeoError::ValidationError(_) => {
            ClassifiedError::new(ErrorCategory::ValidationError, text)
        }
        VeoError::MissingCredential => {
            ClassifiedError::new(ErrorCategory::InvalidCredential, MISSING_KEY_MESSAGE)
                .with_credential_prompt()
        }
        VeoError::RequestError(_) => ClassifiedError::new(
            ErrorCategory::TransportError,
            format!("{}. Please try again.", text),
        ),
        VeoError::Busy => ClassifiedError::new(ErrorCategory::Busy, BUSY_MESSAGE),
        _ => ClassifiedError::new(ErrorCategory::Unknown, text),
    }
}
