//! The active-step state machine.

use std::{collections::BTreeSet, sync::Arc, time::Duration};

use shared::domain::{CheckoutSnapshot, CustomerViewType, StepStatus, StepType};
use tracing::{debug, info, warn};

use crate::{
    intent::{AdvanceOptions, NavigationIntent, SignOutContext},
    status::{self, StepStatusCalculator},
    timer::{TimerId, ViewScheduler},
    tracker::AnalyticsBridge,
    NavigationError, PageNavigator,
};

pub const DEFAULT_VIEW_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Moved {
        previous: Option<StepType>,
        active: Option<StepType>,
    },
    /// The hosting page was sent elsewhere; the step flow did not change.
    Redirected { url: String },
}

#[derive(Debug, Clone)]
pub struct NavigatorOptions {
    pub login_url: String,
    pub view_delay: Duration,
}

impl Default for NavigatorOptions {
    fn default() -> Self {
        Self {
            login_url: "/login.php".into(),
            view_delay: DEFAULT_VIEW_DELAY,
        }
    }
}

struct PendingView {
    timer: TimerId,
    step: StepType,
}

pub struct StepNavigator {
    analytics: AnalyticsBridge,
    scheduler: Arc<dyn ViewScheduler>,
    page: Arc<dyn PageNavigator>,
    options: NavigatorOptions,
    snapshot: Option<CheckoutSnapshot>,
    statuses: Vec<StepStatus>,
    active: Option<StepType>,
    loaded: bool,
    invalidated: BTreeSet<StepType>,
    customer_view: CustomerViewType,
    pending_view: Option<PendingView>,
    torn_down: bool,
}

impl StepNavigator {
    pub fn new(
        analytics: AnalyticsBridge,
        scheduler: Arc<dyn ViewScheduler>,
        page: Arc<dyn PageNavigator>,
        options: NavigatorOptions,
    ) -> Self {
        Self {
            analytics,
            scheduler,
            page,
            options,
            snapshot: None,
            statuses: Vec::new(),
            active: None,
            loaded: false,
            invalidated: BTreeSet::new(),
            customer_view: CustomerViewType::default(),
            pending_view: None,
            torn_down: false,
        }
    }

    pub fn active_step(&self) -> Option<StepType> {
        self.active
    }

    pub fn statuses(&self) -> &[StepStatus] {
        &self.statuses
    }

    pub fn customer_view(&self) -> CustomerViewType {
        self.customer_view
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn snapshot(&self) -> Option<&CheckoutSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn pending_view(&self) -> Option<StepType> {
        self.pending_view.as_ref().map(|pending| pending.step)
    }

    /// Reconciles the active step against a newly observed snapshot.
    pub fn apply_snapshot(&mut self, snapshot: CheckoutSnapshot) -> Transition {
        if self.torn_down {
            return Transition::Unchanged;
        }

        let has_config = snapshot.config.is_some();
        self.snapshot = Some(snapshot);
        self.recompute();

        if !self.loaded {
            if !has_config {
                debug!("store config not yet available; deferring step activation");
                return Transition::Unchanged;
            }
            self.loaded = true;
            info!(active = ?status::default_active_step(&self.statuses), "checkout data loaded");
            self.analytics.checkout_started();
            let target = status::default_active_step(&self.statuses);
            return self.activate(target);
        }

        match self.active {
            Some(step) if self.is_required(step) => Transition::Unchanged,
            _ => {
                let target = status::default_active_step(&self.statuses);
                self.activate(target)
            }
        }
    }

    pub fn handle(&mut self, intent: NavigationIntent) -> Result<Transition, NavigationError> {
        if self.torn_down {
            return Err(NavigationError::TornDown);
        }
        debug!(intent = intent.name(), active = ?self.active, "handling navigation intent");

        match intent {
            NavigationIntent::SignOut { context } => self.sign_out(context),
            _ if !self.loaded => Err(NavigationError::NotLoaded),
            NavigationIntent::Edit { step } => self.edit(step),
            NavigationIntent::CompleteAndAdvance { from, options } => {
                Ok(self.complete_and_advance(from, &options))
            }
            NavigationIntent::SkipToStep { step } => self.skip_to(step),
            NavigationIntent::ChangeCustomerView { view } => {
                debug!(?view, "customer view changed");
                self.customer_view = view;
                Ok(Transition::Unchanged)
            }
        }
    }

    /// Emits the deferred step view if `id` is still the pending timer.
    pub fn on_timer_fired(&mut self, id: TimerId) -> Option<StepType> {
        if self.torn_down {
            return None;
        }
        match self.pending_view.take() {
            Some(pending) if pending.timer == id => {
                self.analytics.step_viewed(pending.step);
                Some(pending.step)
            }
            other => {
                debug!(%id, "ignoring superseded view timer");
                self.pending_view = other;
                None
            }
        }
    }

    pub fn teardown(&mut self) {
        if let Some(pending) = self.pending_view.take() {
            self.scheduler.cancel(pending.timer);
        }
        self.torn_down = true;
    }

    fn edit(&mut self, step: StepType) -> Result<Transition, NavigationError> {
        let status = status::find(&self.statuses, step).ok_or(NavigationError::NotLoaded)?;
        if !status.is_required {
            return Err(NavigationError::StepNotRequired(step));
        }
        Ok(self.activate(Some(step)))
    }

    fn complete_and_advance(&mut self, from: StepType, options: &AdvanceOptions) -> Transition {
        self.invalidated.remove(&from);
        self.recompute();

        if status::find(&self.statuses, from).is_some_and(|status| !status.is_complete) {
            warn!(step = %from, "step confirmed but checkout data still reports it incomplete");
        }
        self.analytics.step_completed(from);

        let next = status::next_incomplete_after(&self.statuses, from, &options.skip).or_else(|| {
            self.statuses
                .iter()
                .filter(|status| !options.skips(status.step_type))
                .find(|status| status.is_required && !status.is_complete)
                .map(|status| status.step_type)
        });
        self.activate(next)
    }

    fn sign_out(&mut self, context: SignOutContext) -> Result<Transition, NavigationError> {
        if context.is_cart_empty {
            let url = self.options.login_url.clone();
            info!(%url, "signed out with an empty cart; leaving checkout");
            self.page.navigate_to(&url);
            return Ok(Transition::Redirected { url });
        }
        if !self.loaded {
            return Err(NavigationError::NotLoaded);
        }

        for step in StepType::ALL {
            if step == StepType::Customer || step.depends_on_customer() {
                self.invalidated.insert(step);
                self.analytics.forget_completion(step);
            }
        }
        self.customer_view = CustomerViewType::Guest;
        self.recompute();
        Ok(self.activate(Some(StepType::Customer)))
    }

    fn skip_to(&mut self, step: StepType) -> Result<Transition, NavigationError> {
        let target = status::first_required_from(&self.statuses, step)
            .ok_or(NavigationError::StepNotRequired(step))?;
        Ok(self.activate(Some(target)))
    }

    fn is_required(&self, step: StepType) -> bool {
        status::find(&self.statuses, step).is_some_and(|status| status.is_required)
    }

    fn recompute(&mut self) {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return;
        };
        let mut statuses = StepStatusCalculator::compute(snapshot);
        for status in statuses.iter_mut() {
            if self.invalidated.contains(&status.step_type) {
                status.is_complete = false;
            }
        }
        status::mark_active(&mut statuses, self.active);
        self.statuses = statuses;
    }

    fn activate(&mut self, target: Option<StepType>) -> Transition {
        if target == self.active {
            return Transition::Unchanged;
        }

        let previous = self.active;
        self.active = target;
        status::mark_active(&mut self.statuses, target);
        debug!(?previous, active = ?target, "active step changed");

        if let Some(pending) = self.pending_view.take() {
            self.scheduler.cancel(pending.timer);
        }
        if let Some(step) = target {
            let timer = self.scheduler.schedule(self.options.view_delay);
            self.pending_view = Some(PendingView { timer, step });
        }

        Transition::Moved {
            previous,
            active: target,
        }
    }
}

#[cfg(test)]
#[path = "tests/navigator_tests.rs"]
mod tests;
