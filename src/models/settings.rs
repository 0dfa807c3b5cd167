use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// Bundled conditioning image used until the user picks their own.
pub const DEFAULT_IMAGE_BASE64: &str = "/9j/4AAQSkZJRgABAQEAYABgAAD/2wBDAAYEBQYFBAYGBQYHBwYIChAKCgkJChQODwwQFxQYGBcUFhYaHSUfGhsjHBYWICwgIyYnKSopGR8tMC0oMCUoKSj/2wBDAQcHBwoIChMKChMoGhYaKCgoKCgoKCgoKCgoKCgoKCgoKCgoKCgoKCgoKCgoKCgoKCgoKCgoKCgoKCgoKCgoKCj/wAARCAAgACADASIAAhEBAxEB/8QAGQABAAMBAQAAAAAAAAAAAAAAAAUGBwID/8QALhAAAQMDAwIDBwUAAAAAAAAAAQIDBAAFEQYSIRMxB1FBBxQiMmGBQlJjcYGh/8QAFgEBAQEAAAAAAAAAAAAAAAAAAgED/8QAGhEBAQEAAwEAAAAAAAAAAAAAAAERAhIhMf/aAAwDAQACEQMRAD8A9yooooCigKKDigKKgXa6wrPEXJmvpaQnoOpUfQAbmqy5cQX65uKbtLLNtY6JcdBeX+g2T+SaXLLF0X+iuGucm7T21fqufLbSdi1hCEg/oAP1qK3fL9ak+G/e3JDR2S+hC1J+igNp+xNIyy31XqVBXJ9kv9sv7RVEeIcT/ADWF7LT+R6j3G1dBQUUUUBRRRQFFFAVV8R3uRa4aWIeDPeJbbB3wgfmd+g/vUvdrrFs0BcyVnwgQAEjKlE7AD3Jrj9yudwuF2VdLg0uM6oBDbKxu02Og9j3PuaTLLB3dFp+mQo0KG3HYSENoGAB/1L96m0KxXG7xYF0Yny45kNFbSGZDiAhWfKSEqA6EA7Vv3uU+w20zGdW06+vwhxBAKAQSpQz2Skn8kVR2WNGtlyf8ABmOQW31IcbkocUAvb5kqztnbfHXPvWM124zQ/cTcN6LJfK3XN3FqUpSifck5NSl6nC4TG2o8hySyy2Gg+4oqU4eqjn2J29gBVhxbChQLK6qO0gLWpLaSMZSTuQfdQBx7E1S6ZpEmdYlQnnVOMocK2AtW7efmA9hnP4IpLJn47fRRRVmFFFFAUUUUH//Z";
pub const DEFAULT_IMAGE_NAME: &str = "robot.jpg";
pub const DEFAULT_IMAGE_MIME_TYPE: &str = "image/jpeg";
pub const DEFAULT_ASPECT_RATIO: &str = "16:9";
pub const DEFAULT_DURATION_SECONDS: i64 = 5;
pub const NO_FILE_CHOSEN: &str = "No file chosen";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Standard,
    High,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Standard => "standard",
            Quality::High => "high",
        }
    }
}

/// The generation parameters the user is currently editing.
///
/// This is both what the next job is built from and what gets snapshotted to
/// storage after every edit. Field names on the wire match the snapshot
/// layout written by earlier releases, so old snapshots keep loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Configuration {
    pub prompt: String,
    /// Base64-encoded image bytes.
    #[serde(rename = "base64data")]
    pub image_bytes: Option<String>,
    #[serde(rename = "mimeType")]
    pub image_mime_type: Option<String>,
    pub aspect_ratio: String,
    /// Persisted but not sent; the job API has no quality knob yet.
    pub quality: Quality,
    pub duration_seconds: Option<i64>,
    pub file_name: Option<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            prompt: String::new(),
            image_bytes: Some(DEFAULT_IMAGE_BASE64.to_string()),
            image_mime_type: Some(DEFAULT_IMAGE_MIME_TYPE.to_string()),
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            quality: Quality::Standard,
            duration_seconds: Some(DEFAULT_DURATION_SECONDS),
            file_name: Some(DEFAULT_IMAGE_NAME.to_string()),
        }
    }
}

impl Configuration {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// A configuration with no conditioning image.
    pub fn text_only(prompt: impl Into<String>) -> Self {
        Self::new(prompt).without_image()
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = aspect_ratio.into();
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_duration(mut self, seconds: Option<i64>) -> Self {
        self.duration_seconds = seconds;
        self
    }

    /// Attach raw image bytes, encoding them the way the job API expects.
    pub fn with_image(
        mut self,
        bytes: &[u8],
        mime_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        self.image_bytes = Some(STANDARD.encode(bytes));
        self.image_mime_type = Some(mime_type.into());
        self.file_name = Some(file_name.into());
        self
    }

    pub fn without_image(mut self) -> Self {
        self.image_bytes = None;
        self.image_mime_type = None;
        self.file_name = Some(NO_FILE_CHOSEN.to_string());
        self
    }

    pub fn has_prompt(&self) -> bool {
        !self.prompt.trim().is_empty()
    }

    pub fn has_image(&self) -> bool {
        self.image_bytes.as_deref().map_or(false, |b| !b.is_empty())
    }
}
