use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::{
    classifier::{ClassifiedError, ErrorClassifier, MessageClassifier, EMPTY_PROMPT_MESSAGE},
    config::PollPolicy,
    error::{Result, VeoError},
    logger,
    models::{Configuration, MaterializedResult, PollOutcome},
    veo::{
        api::JobApi,
        credentials::CredentialProvider,
        fetcher::ResultFetcher,
        poller::{Clock, PollLoop, TokioClock},
        request::RequestBuilder,
    },
};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    Building,
    Submitting,
    Polling,
    Fetching,
    Succeeded,
    Failed,
}

/// UI-facing callbacks for one controller.
pub trait GenerationObserver: Send + Sync {
    fn on_state(&self, _state: GenerationState) {}

    fn on_progress(&self, fraction: f64);

    fn on_success(&self, _results: &[MaterializedResult]) {}

    fn on_failure(&self, _error: &ClassifiedError) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl GenerationObserver for LoggingObserver {
    fn on_progress(&self, fraction: f64) {
        let percent = (fraction * 100.0).floor().min(100.0);
        if fraction < 1.0 {
            log::info!("Generating... This can take a few minutes. ({}%)", percent);
        } else {
            log::info!("Processing video...");
        }
    }

    fn on_success(&self, results: &[MaterializedResult]) {
        log::info!("Video generated successfully ({} file(s))", results.len());
    }

    fn on_failure(&self, error: &ClassifiedError) {
        log::error!("{}", error.message);
    }
}

/// Marks the controller busy for as long as it lives.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs one video generation at a time, end to end.
///
/// Every failure, whatever stage it comes from, leaves as a
/// [`ClassifiedError`].
pub struct GenerationController {
    api: Arc<dyn JobApi>,
    credentials: Arc<dyn CredentialProvider>,
    observer: Arc<dyn GenerationObserver>,
    classifier: Arc<dyn ErrorClassifier>,
    clock: Arc<dyn Clock>,
    builder: RequestBuilder,
    policy: PollPolicy,
    busy: AtomicBool,
    state: Mutex<GenerationState>,
}

impl GenerationController {
    pub fn new(api: Arc<dyn JobApi>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            api,
            credentials,
            observer: Arc::new(LoggingObserver),
            classifier: Arc::new(MessageClassifier),
            clock: Arc::new(TokioClock),
            builder: RequestBuilder::default(),
            policy: PollPolicy::default(),
            busy: AtomicBool::new(false),
            state: Mutex::new(GenerationState::Idle),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn GenerationObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.builder = RequestBuilder::new(model);
        self
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn state(&self) -> GenerationState {
        match self.state.lock() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_state(&self, state: GenerationState) {
        match self.state.lock() {
            Ok(mut current) => *current = state,
            Err(poisoned) => *poisoned.into_inner() = state,
        }
        self.observer.on_state(state);
    }

    pub async fn generate(
        &self,
        config: &Configuration,
    ) -> std::result::Result<Vec<MaterializedResult>, ClassifiedError> {
        let Some(in_flight) = InFlight::acquire(&self.busy) else {
            log::warn!("Rejected generate call: a generation is already in progress");
            return Err(self.classifier.classify(&VeoError::Busy));
        };

        let attempt_id = Uuid::new_v4();
        let outcome = {
            let _timer = logger::timer(&format!("video generation {}", attempt_id));
            self.run(config, attempt_id).await
        };

        match outcome {
            Ok(results) => {
                self.set_state(GenerationState::Succeeded);
                self.observer.on_success(&results);
                drop(in_flight);
                Ok(results)
            }
            Err(cause) => {
                log::error!("[{}] Video generation failed: {}", attempt_id, cause);
                let classified = self.classifier.classify(&cause);
                self.set_state(GenerationState::Failed);
                self.observer.on_failure(&classified);
                drop(in_flight);
                if classified.requires_credential_prompt {
                    self.credentials.request_credential().await;
                }
                Err(classified)
            }
        }
    }

    async fn run(&self, config: &Configuration, attempt_id: Uuid) -> Result<Vec<MaterializedResult>> {
        self.set_state(GenerationState::Building);
        if !config.has_prompt() {
            return Err(VeoError::ValidationError(EMPTY_PROMPT_MESSAGE.to_string()));
        }
        let credential = self
            .credentials
            .credential()
            .await
            .ok_or(VeoError::MissingCredential)?;
        let payload = self.builder.build(config);

        self.set_state(GenerationState::Submitting);
        log::info!("[{}] Initializing video generation", attempt_id);
        let handle = self.api.submit(&payload, &credential).await?;

        self.set_state(GenerationState::Polling);
        let poll_loop = PollLoop::new(self.api.clone(), self.clock.clone(), self.policy);
        let observer = self.observer.clone();
        let mut on_progress = move |fraction: f64| observer.on_progress(fraction);
        let refs = match poll_loop.run(handle, &credential, &mut on_progress).await {
            PollOutcome::Done(refs) => refs,
            PollOutcome::TimedOut(attempts) | PollOutcome::Pending(attempts) => {
                return Err(VeoError::Timeout { attempts })
            }
            PollOutcome::Failed(cause) => return Err(cause),
        };

        self.set_state(GenerationState::Fetching);
        let results = ResultFetcher::new(self.api.clone())
            .fetch(&refs, &config.prompt, &credential)
            .await?;
        log::info!("[{}] Fetched {} video(s)", attempt_id, results.len());
        Ok(results)
    }
}
