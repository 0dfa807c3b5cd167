use crate::{
    config::DEFAULT_MODEL,
    models::{Configuration, ImageInput, SubmissionPayload, VideoGenerationConfig, VIDEOS_PER_REQUEST},
};

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    model: String,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl RequestBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build(&self, config: &Configuration) -> SubmissionPayload {
        let aspect_ratio = Some(config.aspect_ratio.trim())
            .filter(|ratio| !ratio.is_empty())
            .map(String::from);

        let duration_seconds = config
            .duration_seconds
            .filter(|seconds| *seconds > 0)
            .and_then(|seconds| u32::try_from(seconds).ok());

        let image = match (&config.image_bytes, &config.image_mime_type) {
            (Some(bytes), Some(mime_type)) if !bytes.is_empty() && !mime_type.is_empty() => {
                Some(ImageInput {
                    image_bytes: bytes.clone(),
                    mime_type: mime_type.clone(),
                })
            }
            (Some(bytes), _) if !bytes.is_empty() => {
                log::warn!("Image attached without a MIME type, submitting text-only request");
                None
            }
            _ => None,
        };

        SubmissionPayload {
            model: self.model.clone(),
            prompt: config.prompt.clone(),
            config: VideoGenerationConfig {
                number_of_videos: VIDEOS_PER_REQUEST,
                aspect_ratio,
                duration_seconds,
            },
            image,
        }
    }
}
