use serde::{Deserialize, Serialize};

use crate::error::VeoError;

/// Always one video per request.
pub const VIDEOS_PER_REQUEST: u32 = 1;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub model: String,
    pub prompt: String,
    pub config: VideoGenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageInput>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoGenerationConfig {
    pub number_of_videos: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageInput {
    /// Base64-encoded.
    pub image_bytes: String,
    pub mime_type: String,
}

/// One generated video as reported by the job API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultRef {
    pub uri: String,
    pub mime_type: Option<String>,
}

/// Remote job reference, refreshed on every status query.
#[derive(Debug, Clone, PartialEq)]
pub struct JobHandle {
    pub name: String,
    pub done: bool,
    pub results: Vec<ResultRef>,
    /// Error reported by the job itself once it finished unsuccessfully.
    pub error: Option<String>,
}

impl JobHandle {
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: false,
            results: Vec::new(),
            error: None,
        }
    }

    pub fn completed(name: impl Into<String>, results: Vec<ResultRef>) -> Self {
        Self {
            name: name.into(),
            done: true,
            results,
            error: None,
        }
    }
}

#[derive(Debug)]
pub enum PollOutcome {
    Pending(u32),
    Done(Vec<ResultRef>),
    TimedOut(u32),
    Failed(VeoError),
}

/// A downloaded video held in memory, ready for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedResult {
    pub data: Vec<u8>,
    pub mime_type: Option<String>,
    pub source_uri: String,
    pub file_name: String,
}

impl MaterializedResult {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
