use thiserror::Error;

#[derive(Debug, Error)]
pub enum VeoError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },
    #[error("Response error: {0}")]
    ResponseError(String),
    /// The job finished, but the service reported it as failed.
    #[error("Video generation failed: {0}")]
    JobFailed(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Video generation timed out after {attempts} status checks")]
    Timeout { attempts: u32 },
    #[error("No videos were generated. The prompt may have been blocked.")]
    EmptyResult,
    #[error("API key is not configured")]
    MissingCredential,
    #[error("A video generation is already in progress")]
    Busy,
}

pub type Result<T> = std::result::Result<T, VeoError>;
