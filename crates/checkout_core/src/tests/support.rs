use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{anyhow, Result};
use embedding::ParentFrame;
use shared::{
    domain::{
        Address, Cart, CartId, CheckoutSnapshot, Consignment, ConsignmentId, Customer, LineItem,
        LineItemId, LineItems, Order, ShippingOption, StepType, StoreConfig,
    },
    error::CheckoutError,
    protocol::{AnalyticsSignal, StyleOverrides},
};

use crate::{
    navigator::{NavigatorOptions, StepNavigator},
    timer::{TimerId, ViewScheduler},
    tracker::{AnalyticsBridge, StepTracker},
    ErrorSink, PageNavigator, StylesheetSink,
};

pub const LOGIN_URL: &str = "https://store.example/login.php";

#[derive(Default)]
pub struct RecordingTracker {
    signals: Mutex<Vec<AnalyticsSignal>>,
}

impl RecordingTracker {
    pub fn signals(&self) -> Vec<AnalyticsSignal> {
        self.signals.lock().expect("signals").clone()
    }

    pub fn viewed(&self) -> Vec<String> {
        self.signals()
            .into_iter()
            .filter_map(|signal| match signal {
                AnalyticsSignal::StepViewed { step_name } => Some(step_name),
                _ => None,
            })
            .collect()
    }

    pub fn completed(&self) -> Vec<String> {
        self.signals()
            .into_iter()
            .filter_map(|signal| match signal {
                AnalyticsSignal::StepCompleted { step_name } => Some(step_name),
                _ => None,
            })
            .collect()
    }

    pub fn started_count(&self) -> usize {
        self.signals()
            .iter()
            .filter(|signal| **signal == AnalyticsSignal::CheckoutStarted)
            .count()
    }
}

impl StepTracker for RecordingTracker {
    fn on_checkout_started(&self) {
        self.signals
            .lock()
            .expect("signals")
            .push(AnalyticsSignal::CheckoutStarted);
    }

    fn on_step_viewed(&self, step: StepType) {
        self.signals
            .lock()
            .expect("signals")
            .push(AnalyticsSignal::step_viewed(step));
    }

    fn on_step_completed(&self, step: StepType) {
        self.signals
            .lock()
            .expect("signals")
            .push(AnalyticsSignal::step_completed(step));
    }
}

/// Scheduler whose timers only fire when the test says so.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualSchedulerState>,
}

#[derive(Default)]
struct ManualSchedulerState {
    next_id: u64,
    scheduled: Vec<(TimerId, Duration)>,
    cancelled: Vec<TimerId>,
}

impl ManualScheduler {
    pub fn scheduled(&self) -> Vec<(TimerId, Duration)> {
        self.state.lock().expect("scheduler").scheduled.clone()
    }

    pub fn cancelled(&self) -> Vec<TimerId> {
        self.state.lock().expect("scheduler").cancelled.clone()
    }

    /// Timers scheduled and not cancelled, oldest first.
    pub fn live(&self) -> Vec<TimerId> {
        let state = self.state.lock().expect("scheduler");
        state
            .scheduled
            .iter()
            .map(|(id, _)| *id)
            .filter(|id| !state.cancelled.contains(id))
            .collect()
    }

    pub fn last(&self) -> TimerId {
        self.scheduled().last().expect("a scheduled timer").0
    }
}

impl ViewScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration) -> TimerId {
        let mut state = self.state.lock().expect("scheduler");
        state.next_id += 1;
        let id = TimerId(state.next_id);
        state.scheduled.push((id, delay));
        id
    }

    fn cancel(&self, id: TimerId) {
        self.state.lock().expect("scheduler").cancelled.push(id);
    }
}

#[derive(Default)]
pub struct RecordingPageNavigator {
    urls: Mutex<Vec<String>>,
}

impl RecordingPageNavigator {
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().expect("urls").clone()
    }
}

impl PageNavigator for RecordingPageNavigator {
    fn navigate_to(&self, url: &str) {
        self.urls.lock().expect("urls").push(url.to_string());
    }
}

#[derive(Default)]
pub struct RecordingErrorSink {
    errors: Mutex<Vec<CheckoutError>>,
}

impl RecordingErrorSink {
    pub fn errors(&self) -> Vec<CheckoutError> {
        self.errors.lock().expect("errors").clone()
    }
}

impl ErrorSink for RecordingErrorSink {
    fn report(&self, error: &CheckoutError) {
        self.errors.lock().expect("errors").push(error.clone());
    }
}

#[derive(Default)]
pub struct RecordingStylesheet {
    appended: Mutex<Vec<StyleOverrides>>,
}

impl RecordingStylesheet {
    pub fn appended(&self) -> Vec<StyleOverrides> {
        self.appended.lock().expect("appended").clone()
    }
}

impl StylesheetSink for RecordingStylesheet {
    fn append_styles(&self, styles: &StyleOverrides) {
        self.appended.lock().expect("appended").push(styles.clone());
    }
}

#[derive(Default)]
pub struct RecordingParentFrame {
    posted: Mutex<Vec<serde_json::Value>>,
    fail_with: Option<String>,
}

impl RecordingParentFrame {
    pub fn failing(err: impl Into<String>) -> Self {
        Self {
            posted: Mutex::new(Vec::new()),
            fail_with: Some(err.into()),
        }
    }

    pub fn posted(&self) -> Vec<serde_json::Value> {
        self.posted.lock().expect("posted").clone()
    }

    pub fn posted_types(&self) -> Vec<String> {
        self.posted()
            .iter()
            .map(|message| message["type"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

impl ParentFrame for RecordingParentFrame {
    fn post_message(&self, message: &str, _target_origin: &str) -> Result<()> {
        if let Some(err) = &self.fail_with {
            return Err(anyhow!(err.clone()));
        }
        self.posted
            .lock()
            .expect("posted")
            .push(serde_json::from_str(message).expect("posted json"));
        Ok(())
    }
}

pub struct NavigatorHarness {
    pub navigator: StepNavigator,
    pub tracker: Arc<RecordingTracker>,
    pub scheduler: Arc<ManualScheduler>,
    pub page: Arc<RecordingPageNavigator>,
}

impl NavigatorHarness {
    pub fn new() -> Self {
        let tracker = Arc::new(RecordingTracker::default());
        let scheduler = Arc::new(ManualScheduler::default());
        let page = Arc::new(RecordingPageNavigator::default());
        let navigator = StepNavigator::new(
            AnalyticsBridge::new(tracker.clone()),
            scheduler.clone(),
            page.clone(),
            NavigatorOptions {
                login_url: LOGIN_URL.into(),
                view_delay: Duration::from_millis(300),
            },
        );
        Self {
            navigator,
            tracker,
            scheduler,
            page,
        }
    }

    /// Fires the most recently scheduled timer.
    pub fn settle(&mut self) -> Option<StepType> {
        let id = self.scheduler.last();
        self.navigator.on_timer_fired(id)
    }
}

pub fn line_item(id: &str) -> LineItem {
    LineItem {
        id: LineItemId(id.into()),
        name: format!("item {id}"),
        quantity: 1,
        category_names: Vec::new(),
    }
}

pub fn cart(physical: usize, digital: usize) -> Cart {
    Cart {
        id: CartId("cart-1".into()),
        line_items: LineItems {
            physical_items: (0..physical).map(|i| line_item(&format!("p{i}"))).collect(),
            digital_items: (0..digital).map(|i| line_item(&format!("d{i}"))).collect(),
            gift_certificates: Vec::new(),
        },
    }
}

pub fn address() -> Address {
    Address {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        address1: "12 Analytical St".into(),
        city: "London".into(),
        postal_code: "N1 9GU".into(),
        country_code: "GB".into(),
        email: None,
    }
}

pub fn guest(email: Option<&str>) -> Customer {
    Customer {
        id: 0,
        email: email.map(str::to_string),
        is_guest: true,
        store_credit: 0.0,
    }
}

pub fn signed_in() -> Customer {
    Customer {
        id: 42,
        email: Some("ada@example.com".into()),
        is_guest: false,
        store_credit: 10.0,
    }
}

pub fn ready_consignment() -> Consignment {
    Consignment {
        id: ConsignmentId("c-1".into()),
        line_item_ids: vec![LineItemId("p0".into())],
        shipping_address: Some(address()),
        selected_shipping_option: Some(ShippingOption {
            id: "flat".into(),
            description: "Flat rate".into(),
            cost: 5.0,
        }),
    }
}

/// Non-empty cart with one physical item and nothing filled in yet.
pub fn fresh_snapshot() -> CheckoutSnapshot {
    CheckoutSnapshot {
        cart: Some(cart(1, 0)),
        customer: Some(guest(None)),
        config: Some(StoreConfig::default()),
        ..CheckoutSnapshot::default()
    }
}

pub fn digital_snapshot() -> CheckoutSnapshot {
    CheckoutSnapshot {
        cart: Some(cart(0, 2)),
        customer: Some(guest(None)),
        config: Some(StoreConfig::default()),
        ..CheckoutSnapshot::default()
    }
}

pub fn with_customer(mut snapshot: CheckoutSnapshot, customer: Customer) -> CheckoutSnapshot {
    snapshot.customer = Some(customer);
    snapshot
}

pub fn with_shipping(mut snapshot: CheckoutSnapshot) -> CheckoutSnapshot {
    snapshot.consignments = Some(vec![ready_consignment()]);
    snapshot
}

pub fn with_billing(mut snapshot: CheckoutSnapshot) -> CheckoutSnapshot {
    snapshot.billing_address = Some(address());
    snapshot
}

pub fn with_order(mut snapshot: CheckoutSnapshot) -> CheckoutSnapshot {
    snapshot.order = Some(Order {
        order_id: 100,
        is_complete: true,
    });
    snapshot
}
