//! Step orchestration for a multi-step checkout: status derivation, active-step
//! navigation and the side channels that observe it.

use shared::{domain::StepType, error::CheckoutError, protocol::StyleOverrides};
use thiserror::Error;
use tracing::{error, info};

pub mod intent;
pub mod loader;
pub mod navigator;
pub mod session;
pub mod status;
pub mod timer;
pub mod tracker;

pub use intent::{AdvanceOptions, NavigationIntent, SignOutContext};
pub use loader::{
    CheckoutLoader, FileCheckoutLoader, HttpCheckoutLoader, LoadCheckoutRequest,
    CHECKOUT_INCLUDES,
};
pub use navigator::{NavigatorOptions, StepNavigator, Transition, DEFAULT_VIEW_DELAY};
pub use session::{CheckoutSession, SessionEvent, SessionSettings};
pub use status::StepStatusCalculator;
pub use timer::{TimerId, TokioViewScheduler, ViewScheduler};
pub use tracker::{AnalyticsBridge, NoopStepTracker, StepTracker, TracingStepTracker};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("checkout data has not been loaded yet")]
    NotLoaded,
    #[error("checkout session has been torn down")]
    TornDown,
    #[error("{0} step is not required for this checkout")]
    StepNotRequired(StepType),
}

/// Receives every error surfaced by a step, the loader or the messaging bridge.
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: &CheckoutError);
}

pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, err: &CheckoutError) {
        error!(kind = ?err.kind(), step = ?err.step(), "{err}");
    }
}

/// Navigation of the hosting page, outside the step flow.
pub trait PageNavigator: Send + Sync {
    fn navigate_to(&self, url: &str);
}

pub struct LoggingPageNavigator;

impl PageNavigator for LoggingPageNavigator {
    fn navigate_to(&self, url: &str) {
        info!(%url, "navigating hosting page");
    }
}

/// Appends parent-provided style overrides to the document.
pub trait StylesheetSink: Send + Sync {
    fn append_styles(&self, styles: &StyleOverrides);
}

pub struct MissingStylesheetSink;

impl StylesheetSink for MissingStylesheetSink {
    fn append_styles(&self, styles: &StyleOverrides) {
        info!(targets = styles.len(), "no stylesheet available; dropping parent styles");
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
