use crate::{
    config::ClientConfig,
    error::{Result, VeoError},
    models::{JobHandle, ResultRef, SubmissionPayload},
};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Raw bytes of one generated video.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// The remote long-running job service.
///
/// The credential is opaque: implementations attach it to requests and
/// never inspect it.
#[async_trait]
pub trait JobApi: Send + Sync {
    async fn submit(&self, payload: &SubmissionPayload, credential: &str) -> Result<JobHandle>;

    async fn poll(&self, handle: &JobHandle, credential: &str) -> Result<JobHandle>;

    async fn fetch_payload(&self, uri: &str, credential: &str) -> Result<Payload>;
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: RemoteError,
}

#[derive(Deserialize)]
struct RemoteError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<RemoteError>,
    #[serde(default)]
    response: Option<OperationResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    #[serde(default)]
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
    #[serde(default)]
    rai_media_filtered_reasons: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedSample {
    video: Option<VideoRef>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoRef {
    uri: Option<String>,
    mime_type: Option<String>,
}

/// [`JobApi`] over the Generative Language REST endpoints.
#[derive(Clone)]
pub struct HttpJobApi {
    client: Client,
    base_url: String,
}

impl HttpJobApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.base_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn error_from_response(response: Response) -> VeoError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        api_error(status, &body)
    }
}

/// Transport failure with the request URL stripped from the message.
fn transport_error(context: &str, e: reqwest::Error) -> VeoError {
    VeoError::RequestError(format!("{}: {}", context, e.without_url()))
}

/// Maps a non-success response onto [`VeoError::ApiError`], preferring the
/// service's `error.message`.
pub fn api_error(status: u16, body: &str) -> VeoError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ if body.trim().is_empty() => format!("HTTP status {}", status),
        _ => body.to_string(),
    };
    VeoError::ApiError { status, message }
}

/// Request body for `:predictLongRunning`.
pub fn predict_body(payload: &SubmissionPayload) -> Value {
    let mut instance = json!({ "prompt": payload.prompt });
    if let Some(image) = &payload.image {
        instance["image"] = json!({
            "bytesBase64Encoded": image.image_bytes,
            "mimeType": image.mime_type
        });
    }

    let mut parameters = json!({ "sampleCount": payload.config.number_of_videos });
    if let Some(aspect_ratio) = &payload.config.aspect_ratio {
        parameters["aspectRatio"] = json!(aspect_ratio);
    }
    if let Some(duration) = payload.config.duration_seconds {
        parameters["durationSeconds"] = json!(duration);
    }

    json!({
        "instances": [instance],
        "parameters": parameters
    })
}

/// Converts an operation resource into a [`JobHandle`].
pub fn parse_operation(body: &str) -> Result<JobHandle> {
    let operation: Operation = serde_json::from_str(body)
        .map_err(|e| VeoError::ResponseError(format!("Malformed operation: {}", e)))?;

    let mut results = Vec::new();
    if let Some(video_response) = operation
        .response
        .and_then(|response| response.generate_video_response)
    {
        if !video_response.rai_media_filtered_reasons.is_empty() {
            log::warn!(
                "Generated videos were filtered: {}",
                video_response.rai_media_filtered_reasons.join("; ")
            );
        }
        results = video_response
            .generated_samples
            .into_iter()
            .filter_map(|sample| sample.video)
            .filter_map(|video| {
                video.uri.map(|uri| ResultRef {
                    uri,
                    mime_type: video.mime_type,
                })
            })
            .collect();
    }

    Ok(JobHandle {
        name: operation.name,
        done: operation.done,
        results,
        error: operation.error.map(|e| match e.code {
            Some(code) => format!("{} (code {})", e.message, code),
            None => e.message,
        }),
    })
}

#[async_trait]
impl JobApi for HttpJobApi {
    async fn submit(&self, payload: &SubmissionPayload, credential: &str) -> Result<JobHandle> {
        let url = format!(
            "{}/models/{}:predictLongRunning",
            self.base_url, payload.model
        );
        let body = predict_body(payload);

        log::info!("Submitting video generation with model: {}", payload.model);
        log::debug!(
            "Submission parameters: {}",
            serde_json::to_string(&body["parameters"]).unwrap_or_default()
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, credential)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("Submission failed", e))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let text = response
            .text()
            .await
            .map_err(|e| transport_error("Failed to read submission response", e))?;
        let handle = parse_operation(&text)?;
        log::info!("Submitted job {}", handle.name);
        Ok(handle)
    }

    async fn poll(&self, handle: &JobHandle, credential: &str) -> Result<JobHandle> {
        let url = format!("{}/{}", self.base_url, handle.name);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, credential)
            .send()
            .await
            .map_err(|e| transport_error("Failed to get video generation status", e))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let text = response
            .text()
            .await
            .map_err(|e| transport_error("Failed to read video generation status", e))?;
        parse_operation(&text)
    }

    async fn fetch_payload(&self, uri: &str, credential: &str) -> Result<Payload> {
        let response = self
            .client
            .get(uri)
            .header(API_KEY_HEADER, credential)
            .send()
            .await
            .map_err(|e| transport_error("Video download failed", e))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error("Video download interrupted", e))?;

        Ok(Payload {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{classify, ErrorCategory};
    use crate::models::{ImageInput, VideoGenerationConfig};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const SECRET: &str = "SECRET-KEY-123";

    fn payload() -> SubmissionPayload {
        SubmissionPayload {
            model: "veo-2.0-generate-001".to_string(),
            prompt: "a fox in the snow".to_string(),
            config: VideoGenerationConfig {
                number_of_videos: 1,
                aspect_ratio: Some("16:9".to_string()),
                duration_seconds: None,
            },
            image: Some(ImageInput {
                image_bytes: "aGk=".to_string(),
                mime_type: "image/png".to_string(),
            }),
        }
    }

    #[test]
    fn test_predict_body() {
        let body = predict_body(&payload());
        assert_eq!(body["instances"][0]["prompt"], "a fox in the snow");
        assert_eq!(body["instances"][0]["image"]["bytesBase64Encoded"], "aGk=");
        assert_eq!(body["instances"][0]["image"]["mimeType"], "image/png");
        assert_eq!(body["parameters"]["sampleCount"], 1);
        assert_eq!(body["parameters"]["aspectRatio"], "16:9");
        assert!(body["parameters"].get("durationSeconds").is_none());
    }

    #[test]
    fn test_parse_pending_operation() {
        let handle = parse_operation(r#"{"name": "models/veo/operations/abc"}"#).unwrap();
        assert_eq!(handle, JobHandle::pending("models/veo/operations/abc"));
    }

    #[test]
    fn test_parse_done_operation() {
        let body = r#"{
            "name": "models/veo/operations/abc",
            "done": true,
            "response": {
                "generateVideoResponse": {
                    "generatedSamples": [
                        {"video": {"uri": "https://files/v1:download?alt=media"}},
                        {"video": {}},
                        {"video": {"uri": "https://files/v2:download?alt=media", "mimeType": "video/mp4"}}
                    ]
                }
            }
        }"#;
        let handle = parse_operation(body).unwrap();
        assert!(handle.done);
        assert_eq!(handle.results.len(), 2);
        assert_eq!(handle.results[0].uri, "https://files/v1:download?alt=media");
        assert_eq!(handle.results[1].mime_type.as_deref(), Some("video/mp4"));
    }

    #[test]
    fn test_parse_failed_operation() {
        let body = r#"{"name": "op", "done": true, "error": {"code": 3, "message": "bad prompt"}}"#;
        let handle = parse_operation(body).unwrap();
        assert_eq!(handle.error.as_deref(), Some("bad prompt (code 3)"));
        assert!(handle.results.is_empty());
    }

    #[test]
    fn test_parse_malformed_operation() {
        assert!(matches!(
            parse_operation("<html>"),
            Err(VeoError::ResponseError(_))
        ));
    }

    #[test]
    fn test_api_error_reads_envelope_message() {
        let body = r#"{"error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}}"#;
        match api_error(404, body) {
            VeoError::ApiError { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Requested entity was not found.");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(
            classify(&api_error(404, body)).category,
            ErrorCategory::InvalidConfiguration
        );
    }

    #[test]
    fn test_api_error_empty_body() {
        match api_error(503, "  ") {
            VeoError::ApiError { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "HTTP status 503");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_api_error_plain_text_body() {
        match api_error(400, "API key not valid. Please pass a valid API key.") {
            VeoError::ApiError { message, .. } => {
                assert_eq!(message, "API key not valid. Please pass a valid API key.")
            }
            other => panic!("unexpected error {:?}", other),
        }
        let classified = classify(&api_error(400, "API key not valid."));
        assert_eq!(classified.category, ErrorCategory::InvalidCredential);
    }

    #[tokio::test]
    async fn test_unreachable_host_does_not_leak_key() {
        let api = HttpJobApi::new("http://127.0.0.1:1/v1beta");

        let err = api.submit(&payload(), SECRET).await.unwrap_err();

        assert!(matches!(err, VeoError::RequestError(_)), "{:?}", err);
        assert!(!err.to_string().contains(SECRET));
        let classified = classify(&err);
        assert_eq!(classified.category, ErrorCategory::TransportError);
        assert!(!classified.message.contains(SECRET), "{}", classified.message);
    }

    #[tokio::test]
    async fn test_truncated_body_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{\"name\": ",
                )
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        let api = HttpJobApi::new(format!("http://{}/v1beta", addr));
        let err = api
            .poll(&JobHandle::pending("operations/abc"), SECRET)
            .await
            .unwrap_err();
        let request = server.await.unwrap();

        let request_line = request.lines().next().unwrap_or_default();
        assert!(request_line.starts_with("GET /v1beta/operations/abc"));
        assert!(!request_line.contains(SECRET));
        assert!(request
            .to_lowercase()
            .contains(&format!("x-goog-api-key: {}", SECRET.to_lowercase())));

        assert!(matches!(err, VeoError::RequestError(_)), "{:?}", err);
        let classified = classify(&err);
        assert_eq!(classified.category, ErrorCategory::TransportError);
        assert!(classified.message.ends_with(". Please try again."));
        assert!(!classified.message.contains(SECRET));
    }
}
