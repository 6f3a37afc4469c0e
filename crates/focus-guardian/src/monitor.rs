//! Polling loop
//!
//! Drives the controller on a fixed interval. Each poll captures the screen
//! and classifies it under one deadline; a poll that misses the deadline, or
//! fails in any other way, reaches the controller as `ClassifierFailed`.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::capture::ScreenSource;
use crate::classifier::{Classifier, PollOutcome};
use crate::controller::{FocusController, Intervention};
use crate::error::GuardianError;
use crate::session::Session;

pub struct Monitor {
    controller: FocusController,
    classifier: Arc<dyn Classifier>,
    screen: Arc<dyn ScreenSource>,
    interval: Duration,
    timeout: Duration,
}

impl Monitor {
    pub fn new(
        controller: FocusController,
        classifier: Arc<dyn Classifier>,
        screen: Arc<dyn ScreenSource>,
        interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            controller,
            classifier,
            screen,
            interval,
            timeout,
        }
    }

    pub fn controller(&self) -> &FocusController {
        &self.controller
    }

    pub fn into_controller(self) -> FocusController {
        self.controller
    }

    /// Capture and classify once against `goal`
    pub async fn poll(&self, goal: &str) -> PollOutcome {
        let screen = self.screen.clone();
        let work = async {
            let sample = tokio::task::spawn_blocking(move || screen.capture())
                .await
                .map_err(|e| GuardianError::Classifier(format!("capture task failed: {e}")))?
                .map_err(|e| GuardianError::Classifier(format!("screen capture failed: {e:#}")))?;
            self.classifier.classify(goal, &sample).await
        };

        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result.into(),
            Err(_) => PollOutcome::ClassifierFailed {
                error: format!("classification timed out after {}s", self.timeout.as_secs_f64()),
            },
        }
    }

    /// One poll applied to the active session
    pub async fn tick(&mut self) -> Intervention {
        let Some(goal) = self.controller.active().map(|s| s.goal.clone()) else {
            return Intervention::None;
        };
        let outcome = self.poll(&goal).await;
        self.controller.apply(outcome)
    }

    /// Start a session for `goal` and poll until `cancel` fires.
    ///
    /// Cancellation drops an in-flight poll; the session is then stopped and
    /// returned with everything recorded so far.
    pub async fn run(&mut self, goal: &str, cancel: CancellationToken) -> Result<Session, GuardianError> {
        let goal = self.controller.start(goal)?.goal.clone();

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let outcome = tokio::select! {
                outcome = self.poll(&goal) => Some(outcome),
                _ = cancel.cancelled() => None,
            };
            let Some(outcome) = outcome else {
                tracing::debug!("in-flight poll dropped");
                break;
            };

            match self.controller.apply(outcome) {
                Intervention::Blocked => tracing::info!("strike threshold reached"),
                Intervention::Warned { strikes } => tracing::debug!(strikes, "warned"),
                Intervention::None => {}
            }
        }

        self.controller.stop()
    }
}
