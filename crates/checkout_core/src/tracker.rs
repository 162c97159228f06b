use std::{collections::BTreeSet, sync::Arc};

use shared::{domain::StepType, protocol::AnalyticsSignal};
use tracing::{debug, info};

/// Analytics capability. Calls are fire-and-forget.
pub trait StepTracker: Send + Sync {
    fn on_checkout_started(&self);
    fn on_step_viewed(&self, step: StepType);
    fn on_step_completed(&self, step: StepType);
}

/// Tracker for sessions without analytics.
pub struct NoopStepTracker;

impl StepTracker for NoopStepTracker {
    fn on_checkout_started(&self) {}

    fn on_step_viewed(&self, _step: StepType) {}

    fn on_step_completed(&self, _step: StepType) {}
}

/// Emits each signal as a structured log line.
pub struct TracingStepTracker;

impl TracingStepTracker {
    fn emit(&self, signal: AnalyticsSignal) {
        match serde_json::to_string(&signal) {
            Ok(encoded) => info!(target: "checkout::analytics", signal = %encoded, "analytics signal"),
            Err(err) => debug!(error = %err, "failed to encode analytics signal"),
        }
    }
}

impl StepTracker for TracingStepTracker {
    fn on_checkout_started(&self) {
        self.emit(AnalyticsSignal::CheckoutStarted);
    }

    fn on_step_viewed(&self, step: StepType) {
        self.emit(AnalyticsSignal::step_viewed(step));
    }

    fn on_step_completed(&self, step: StepType) {
        self.emit(AnalyticsSignal::step_completed(step));
    }
}

/// De-duplicating front for a [`StepTracker`].
///
/// `checkout started` fires once per bridge. A step completion fires on the
/// step's first transition to complete; it fires again only after the step
/// has been invalidated with [`AnalyticsBridge::forget_completion`].
pub struct AnalyticsBridge {
    tracker: Arc<dyn StepTracker>,
    started: bool,
    completed: BTreeSet<StepType>,
}

impl AnalyticsBridge {
    pub fn new(tracker: Arc<dyn StepTracker>) -> Self {
        Self {
            tracker,
            started: false,
            completed: BTreeSet::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopStepTracker))
    }

    pub fn checkout_started(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.tracker.on_checkout_started();
    }

    pub fn step_viewed(&self, step: StepType) {
        self.tracker.on_step_viewed(step);
    }

    pub fn step_completed(&mut self, step: StepType) {
        if !self.completed.insert(step) {
            debug!(%step, "step completion already tracked");
            return;
        }
        self.tracker.on_step_completed(step);
    }

    pub fn forget_completion(&mut self, step: StepType) {
        self.completed.remove(&step);
    }

    pub fn has_started(&self) -> bool {
        self.started
    }
}

#[cfg(test)]
#[path = "tests/tracker_tests.rs"]
mod tests;
