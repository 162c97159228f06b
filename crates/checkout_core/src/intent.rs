use serde::{Deserialize, Serialize};
use shared::domain::{CustomerViewType, StepType};

/// A request from the shopper or a step component, consumed once by the
/// navigator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum NavigationIntent {
    Edit {
        step: StepType,
    },
    CompleteAndAdvance {
        from: StepType,
        #[serde(default)]
        options: AdvanceOptions,
    },
    SignOut {
        #[serde(flatten)]
        context: SignOutContext,
    },
    SkipToStep {
        step: StepType,
    },
    ChangeCustomerView {
        view: CustomerViewType,
    },
}

impl NavigationIntent {
    pub fn edit(step: StepType) -> Self {
        Self::Edit { step }
    }

    pub fn complete(from: StepType) -> Self {
        Self::CompleteAndAdvance {
            from,
            options: AdvanceOptions::default(),
        }
    }

    pub fn sign_out(is_cart_empty: bool) -> Self {
        Self::SignOut {
            context: SignOutContext { is_cart_empty },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NavigationIntent::Edit { .. } => "edit",
            NavigationIntent::CompleteAndAdvance { .. } => "complete_and_advance",
            NavigationIntent::SignOut { .. } => "sign_out",
            NavigationIntent::SkipToStep { .. } => "skip_to_step",
            NavigationIntent::ChangeCustomerView { .. } => "change_customer_view",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceOptions {
    /// Steps the shopper opted out of, e.g. billing when the shipping
    /// address doubles as the billing address.
    #[serde(default)]
    pub skip: Vec<StepType>,
}

impl AdvanceOptions {
    pub fn skipping(step: StepType) -> Self {
        Self { skip: vec![step] }
    }

    pub fn skips(&self, step: StepType) -> bool {
        self.skip.contains(&step)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignOutContext {
    #[serde(default)]
    pub is_cart_empty: bool,
}
