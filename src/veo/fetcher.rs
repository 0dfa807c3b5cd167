use std::sync::Arc;

use crate::{
    error::{Result, VeoError},
    models::{MaterializedResult, ResultRef},
    veo::api::JobApi,
};
use futures::future::try_join_all;

pub const FALLBACK_FILE_STEM: &str = "generated-video";
pub const VIDEO_EXTENSION: &str = "mp4";
const MAX_STEM_CHARS: usize = 50;

/// File-name stem derived from a prompt, safe for any filesystem.
///
/// `"A Robot! Dancing... 2025"` becomes `"a-robot-dancing-2025"`.
pub fn file_stem_for_prompt(prompt: &str) -> String {
    let cleaned: String = prompt
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();

    let stem: String = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .take(MAX_STEM_CHARS)
        .collect();

    if stem.is_empty() {
        FALLBACK_FILE_STEM.to_string()
    } else {
        stem
    }
}

pub struct ResultFetcher {
    api: Arc<dyn JobApi>,
}

impl ResultFetcher {
    pub fn new(api: Arc<dyn JobApi>) -> Self {
        Self { api }
    }

    /// Downloads every result in order. One failed download fails the lot.
    pub async fn fetch(
        &self,
        results: &[ResultRef],
        prompt: &str,
        credential: &str,
    ) -> Result<Vec<MaterializedResult>> {
        if results.is_empty() {
            return Err(VeoError::EmptyResult);
        }

        let stem = file_stem_for_prompt(prompt);
        let downloads = results.iter().enumerate().map(|(index, result)| {
            let file_name = if index == 0 {
                format!("{}.{}", stem, VIDEO_EXTENSION)
            } else {
                format!("{}-{}.{}", stem, index + 1, VIDEO_EXTENSION)
            };
            self.materialize(result, file_name, credential)
        });

        let materialized = try_join_all(downloads).await?;
        log::info!("Video ready for playback and download");
        Ok(materialized)
    }

    async fn materialize(
        &self,
        result: &ResultRef,
        file_name: String,
        credential: &str,
    ) -> Result<MaterializedResult> {
        let payload = self.api.fetch_payload(&result.uri, credential).await?;
        log::debug!("Downloaded {} bytes for {}", payload.bytes.len(), file_name);

        Ok(MaterializedResult {
            data: payload.bytes,
            mime_type: result.mime_type.clone().or(payload.content_type),
            source_uri: result.uri.clone(),
            file_name,
        })
    }
}
