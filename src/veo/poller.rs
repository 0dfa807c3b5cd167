use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::PollPolicy,
    error::VeoError,
    models::{JobHandle, PollOutcome},
    veo::api::JobApi,
};
use async_trait::async_trait;

/// Source of the waits between status queries.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Keeps reported progress inside [0, 1] and never lets it go backwards.
struct ProgressReporter<'a> {
    last: f64,
    sink: &'a mut (dyn FnMut(f64) + Send),
}

impl<'a> ProgressReporter<'a> {
    fn new(sink: &'a mut (dyn FnMut(f64) + Send)) -> Self {
        Self { last: 0.0, sink }
    }

    fn report(&mut self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0).max(self.last);
        self.last = fraction;
        (self.sink)(fraction);
    }
}

/// Watches one submitted job until it finishes or the attempt budget runs out.
///
/// A failed status query ends the loop at once. Retrying is left to whoever
/// started the generation.
pub struct PollLoop {
    api: Arc<dyn JobApi>,
    clock: Arc<dyn Clock>,
    policy: PollPolicy,
}

impl PollLoop {
    pub fn new(api: Arc<dyn JobApi>, clock: Arc<dyn Clock>, policy: PollPolicy) -> Self {
        Self { api, clock, policy }
    }

    /// One polling cycle: wait, then refresh `handle` in place.
    pub async fn poll_once(
        &self,
        handle: &mut JobHandle,
        attempt: u32,
        credential: &str,
    ) -> PollOutcome {
        self.clock.sleep(self.policy.interval).await;

        match self.api.poll(handle, credential).await {
            Ok(refreshed) => *handle = refreshed,
            Err(e) => {
                log::error!("Error polling for operation status: {}", e);
                return PollOutcome::Failed(e);
            }
        }

        if handle.done {
            PollOutcome::Done(handle.results.clone())
        } else {
            PollOutcome::Pending(attempt)
        }
    }

    pub async fn run(
        &self,
        handle: JobHandle,
        credential: &str,
        on_progress: &mut (dyn FnMut(f64) + Send),
    ) -> PollOutcome {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut progress = ProgressReporter::new(on_progress);
        let mut handle = handle;
        let mut attempt = 0;

        while !handle.done && attempt < max_attempts {
            attempt += 1;
            progress.report(f64::from(attempt) / f64::from(max_attempts));
            log::debug!(
                "Waiting for completion of {} ({}/{})",
                handle.name,
                attempt,
                max_attempts
            );

            match self.poll_once(&mut handle, attempt, credential).await {
                PollOutcome::Pending(_) | PollOutcome::Done(_) => {}
                terminal => return terminal,
            }
        }

        if !handle.done {
            log::warn!("{} still running after {} status checks", handle.name, attempt);
            return PollOutcome::TimedOut(attempt);
        }

        if let Some(message) = handle.error.take() {
            return PollOutcome::Failed(VeoError::JobFailed(message));
        }

        progress.report(1.0);
        log::info!("{} completed after {} status checks", handle.name, attempt);
        PollOutcome::Done(handle.results)
    }
}
