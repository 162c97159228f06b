use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{domain::StepType, error::ErrorReport};

/// Style declarations keyed by style target, then by property.
pub type StyleOverrides = BTreeMap<String, BTreeMap<String, String>>;

/// Messages posted from the embedded checkout to its parent frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum OutboundMessage {
    #[serde(rename = "FRAME_LOADED")]
    FrameLoaded {
        #[serde(rename = "contentId")]
        content_id: String,
    },
    #[serde(rename = "CHECKOUT_COMPLETE")]
    OrderComplete,
    #[serde(rename = "CHECKOUT_ERROR")]
    OrderError { error: ErrorReport },
}

/// Messages pushed by the parent frame into the embedded checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum InboundMessage {
    #[serde(rename = "STYLE_CONFIGURED")]
    StyleConfigured(StyleOverrides),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalyticsSignal {
    CheckoutStarted,
    StepViewed { step_name: String },
    StepCompleted { step_name: String },
}

impl AnalyticsSignal {
    pub fn step_viewed(step: StepType) -> Self {
        Self::StepViewed {
            step_name: step.name().to_string(),
        }
    }

    pub fn step_completed(step: StepType) -> Self {
        Self::StepCompleted {
            step_name: step.name().to_string(),
        }
    }
}
