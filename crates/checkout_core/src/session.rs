//! Top-level checkout lifecycle: feeds loads, shopper intents and step
//! callbacks into the navigator and the side channels, one event at a time.

use std::sync::Arc;

use embedding::EmbeddedMessenger;
use shared::{
    domain::{CheckoutId, CheckoutSnapshot, StepType},
    error::{CheckoutError, ErrorReport, StepOperation},
    protocol::StyleOverrides,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, info_span, warn};
use url::Url;
use uuid::Uuid;

use crate::{
    intent::NavigationIntent,
    loader::{CheckoutLoader, LoadCheckoutRequest},
    navigator::{StepNavigator, Transition},
    timer::TimerId,
    ErrorSink, PageNavigator, StylesheetSink,
};

const ORDER_CONFIRMATION_PATH: &str = "order-confirmation";

#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Initial load result or a snapshot refreshed after a step mutation.
    SnapshotLoaded(CheckoutSnapshot),
    LoadFailed(String),
    Intent(NavigationIntent),
    StepFailed {
        operation: StepOperation,
        message: String,
    },
    UnhandledError {
        step: StepType,
        message: String,
    },
    OrderSubmitted,
    OrderFinalized,
    OrderFailed(String),
    FrameMessage {
        raw: String,
        origin: String,
    },
    TimerFired(TimerId),
    Teardown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Id of the element hosting the checkout, reported to the parent frame.
    pub container_id: String,
    pub current_url: String,
}

pub struct CheckoutSession {
    session_id: Uuid,
    navigator: StepNavigator,
    messenger: Arc<dyn EmbeddedMessenger>,
    errors: Arc<dyn ErrorSink>,
    page: Arc<dyn PageNavigator>,
    settings: SessionSettings,
    frame_loaded: bool,
    order_completed: bool,
    closed: bool,
}

impl CheckoutSession {
    pub fn new(
        navigator: StepNavigator,
        messenger: Arc<dyn EmbeddedMessenger>,
        errors: Arc<dyn ErrorSink>,
        page: Arc<dyn PageNavigator>,
        stylesheet: Arc<dyn StylesheetSink>,
        settings: SessionSettings,
    ) -> Self {
        messenger.receive_styles(Box::new(move |styles: &StyleOverrides| {
            stylesheet.append_styles(styles)
        }));

        Self {
            session_id: Uuid::new_v4(),
            navigator,
            messenger,
            errors,
            page,
            settings,
            frame_loaded: false,
            order_completed: false,
            closed: false,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn navigator(&self) -> &StepNavigator {
        &self.navigator
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Issues the single startup load. Failures are reported and leave the
    /// session without an active step; retrying is up to the loader.
    pub async fn load(&mut self, loader: &dyn CheckoutLoader, checkout_id: CheckoutId) -> Transition {
        let request = LoadCheckoutRequest::new(checkout_id);
        match loader.load_checkout(&request).await {
            Ok(snapshot) => self.handle(SessionEvent::SnapshotLoaded(snapshot)),
            Err(err) => self.handle(SessionEvent::LoadFailed(format!("{err:#}"))),
        }
    }

    /// Drains `events` in arrival order until teardown or channel close.
    pub async fn run(&mut self, events: &mut UnboundedReceiver<SessionEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event);
            if self.closed {
                break;
            }
        }
        if !self.closed {
            self.handle(SessionEvent::Teardown);
        }
    }

    pub fn handle(&mut self, event: SessionEvent) -> Transition {
        let _span = info_span!("checkout_session", session_id = %self.session_id).entered();
        if self.closed {
            debug!(?event, "session closed; dropping event");
            return Transition::Unchanged;
        }

        match event {
            SessionEvent::SnapshotLoaded(snapshot) => self.on_snapshot(snapshot),
            SessionEvent::LoadFailed(message) => {
                self.errors.report(&CheckoutError::DataLoad(message));
                Transition::Unchanged
            }
            SessionEvent::Intent(intent) => match self.navigator.handle(intent) {
                Ok(transition) => transition,
                Err(err) => {
                    warn!(error = %err, "navigation intent rejected");
                    Transition::Unchanged
                }
            },
            SessionEvent::StepFailed { operation, message } => {
                self.errors
                    .report(&CheckoutError::StepOperation { operation, message });
                Transition::Unchanged
            }
            SessionEvent::UnhandledError { step, message } => {
                let err = CheckoutError::UnhandledStep { step, message };
                self.errors.report(&err);
                if step == StepType::Payment {
                    let result = self.messenger.post_error(&ErrorReport::from(&err));
                    self.forward_messaging(result);
                }
                Transition::Unchanged
            }
            SessionEvent::OrderSubmitted | SessionEvent::OrderFinalized => self.on_order_complete(),
            SessionEvent::OrderFailed(message) => {
                let err = CheckoutError::OrderSubmission(message);
                self.errors.report(&err);
                let result = self.messenger.post_error(&ErrorReport::from(&err));
                self.forward_messaging(result);
                Transition::Unchanged
            }
            SessionEvent::FrameMessage { raw, origin } => {
                let result = self.messenger.dispatch_inbound(&raw, &origin);
                self.forward_messaging(result);
                Transition::Unchanged
            }
            SessionEvent::TimerFired(id) => {
                self.navigator.on_timer_fired(id);
                Transition::Unchanged
            }
            SessionEvent::Teardown => {
                info!("tearing down checkout session");
                self.navigator.teardown();
                self.closed = true;
                Transition::Unchanged
            }
        }
    }

    fn on_snapshot(&mut self, snapshot: CheckoutSnapshot) -> Transition {
        let transition = self.navigator.apply_snapshot(snapshot);
        if self.navigator.is_loaded() && !self.frame_loaded {
            self.frame_loaded = true;
            let result = self
                .messenger
                .post_frame_loaded(&self.settings.container_id);
            self.forward_messaging(result);
        }
        transition
    }

    fn on_order_complete(&mut self) -> Transition {
        if self.order_completed {
            debug!("order already completed; staying on confirmation");
            return Transition::Unchanged;
        }
        self.order_completed = true;

        let result = self.messenger.post_complete();
        self.forward_messaging(result);

        let url = order_confirmation_url(&self.settings.current_url);
        info!(%url, "order placed; leaving checkout");
        self.page.navigate_to(&url);
        Transition::Redirected { url }
    }

    fn forward_messaging(&self, result: anyhow::Result<()>) {
        if let Err(err) = result {
            self.errors
                .report(&CheckoutError::EmbeddedMessaging(format!("{err:#}")));
        }
    }
}

pub fn order_confirmation_url(current_url: &str) -> String {
    match Url::parse(current_url) {
        Ok(mut url) => {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop_if_empty().push(ORDER_CONFIRMATION_PATH);
            }
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => format!(
            "{}/{ORDER_CONFIRMATION_PATH}",
            current_url.trim_end_matches('/')
        ),
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
