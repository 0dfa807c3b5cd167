use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{
    classifier::ClassifiedError,
    error::{Result, VeoError},
    models::{JobHandle, MaterializedResult, ResultRef, SubmissionPayload},
    veo::{
        api::{JobApi, Payload},
        controller::{GenerationObserver, GenerationState},
        credentials::CredentialProvider,
        poller::Clock,
    },
};
use async_trait::async_trait;
use tokio::sync::Notify;

/// Scripted job service.
#[derive(Default)]
pub struct FakeJobApi {
    done_after: Option<u32>,
    results: Vec<ResultRef>,
    payloads: HashMap<String, Vec<u8>>,
    job_error: Option<String>,
    submit_error: Option<(u16, String)>,
    poll_error_at: Option<(u32, String)>,
    submit_gate: Option<Arc<Notify>>,
    submit_calls: AtomicU32,
    poll_calls: AtomicU32,
    fetch_calls: AtomicU32,
    submitted: Mutex<Vec<SubmissionPayload>>,
    fetch_credentials: Mutex<Vec<String>>,
}

impl FakeJobApi {
    /// Reports done on the `polls`-th status query; `0` means done on submit.
    pub fn completing_after(polls: u32) -> Self {
        Self {
            done_after: Some(polls),
            ..Default::default()
        }
    }

    pub fn never_completing() -> Self {
        Self::default()
    }

    pub fn with_video(mut self, uri: &str, bytes: &[u8]) -> Self {
        self.results.push(ResultRef {
            uri: uri.to_string(),
            mime_type: None,
        });
        self.payloads.insert(uri.to_string(), bytes.to_vec());
        self
    }

    pub fn with_job_error(mut self, message: &str) -> Self {
        self.job_error = Some(message.to_string());
        self
    }

    pub fn failing_submit(mut self, status: u16, message: &str) -> Self {
        self.submit_error = Some((status, message.to_string()));
        self
    }

    pub fn failing_poll_at(mut self, poll: u32, message: &str) -> Self {
        self.poll_error_at = Some((poll, message.to_string()));
        self
    }

    pub fn with_submit_gate(mut self, gate: Arc<Notify>) -> Self {
        self.submit_gate = Some(gate);
        self
    }

    pub fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> u32 {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> u32 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<SubmissionPayload> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn fetch_credentials(&self) -> Vec<String> {
        self.fetch_credentials.lock().unwrap().clone()
    }

    fn handle_after(&self, name: &str, polls: u32) -> JobHandle {
        match self.done_after {
            Some(after) if polls >= after => JobHandle {
                name: name.to_string(),
                done: true,
                results: self.results.clone(),
                error: self.job_error.clone(),
            },
            _ => JobHandle::pending(name),
        }
    }
}

#[async_trait]
impl JobApi for FakeJobApi {
    async fn submit(&self, payload: &SubmissionPayload, _credential: &str) -> Result<JobHandle> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(payload.clone());
        if let Some(gate) = &self.submit_gate {
            gate.notified().await;
        }
        if let Some((status, message)) = &self.submit_error {
            return Err(VeoError::ApiError {
                status: *status,
                message: message.clone(),
            });
        }
        Ok(self.handle_after("operations/test", 0))
    }

    async fn poll(&self, handle: &JobHandle, _credential: &str) -> Result<JobHandle> {
        let polls = self.poll_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((at, message)) = &self.poll_error_at {
            if *at == polls {
                return Err(VeoError::RequestError(message.clone()));
            }
        }
        Ok(self.handle_after(&handle.name, polls))
    }

    async fn fetch_payload(&self, uri: &str, credential: &str) -> Result<Payload> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetch_credentials
            .lock()
            .unwrap()
            .push(credential.to_string());
        match self.payloads.get(uri) {
            Some(bytes) => Ok(Payload {
                bytes: bytes.clone(),
                content_type: Some("video/mp4".to_string()),
            }),
            None => Err(VeoError::ApiError {
                status: 404,
                message: format!("no payload at {}", uri),
            }),
        }
    }
}

/// Returns from every sleep at once and remembers what was asked for.
#[derive(Default)]
pub struct InstantClock {
    sleeps: Mutex<Vec<Duration>>,
}

impl InstantClock {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for InstantClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    states: Mutex<Vec<GenerationState>>,
    progress: Mutex<Vec<f64>>,
    successes: AtomicU32,
    failures: Mutex<Vec<ClassifiedError>>,
}

impl RecordingObserver {
    pub fn states(&self) -> Vec<GenerationState> {
        self.states.lock().unwrap().clone()
    }

    pub fn progress(&self) -> Vec<f64> {
        self.progress.lock().unwrap().clone()
    }

    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> Vec<ClassifiedError> {
        self.failures.lock().unwrap().clone()
    }
}

impl GenerationObserver for RecordingObserver {
    fn on_state(&self, state: GenerationState) {
        self.states.lock().unwrap().push(state);
    }

    fn on_progress(&self, fraction: f64) {
        self.progress.lock().unwrap().push(fraction);
    }

    fn on_success(&self, _results: &[MaterializedResult]) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_failure(&self, error: &ClassifiedError) {
        self.failures.lock().unwrap().push(error.clone());
    }
}

pub struct FakeCredentials {
    key: Option<String>,
    prompts: AtomicU32,
}

impl FakeCredentials {
    pub fn new(key: Option<&str>) -> Self {
        Self {
            key: key.map(String::from),
            prompts: AtomicU32::new(0),
        }
    }

    pub fn prompts(&self) -> u32 {
        self.prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialProvider for FakeCredentials {
    async fn credential(&self) -> Option<String> {
        self.key.clone()
    }

    async fn request_credential(&self) {
        self.prompts.fetch_add(1, Ordering::SeqCst);
    }
}
