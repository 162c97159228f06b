use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::StepType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DataLoad,
    StepOperation,
    OrderSubmission,
    UnhandledStep,
    EmbeddedMessaging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOperation {
    SignIn,
    SignOut,
    ContinueAsGuest,
    CreateAccount,
    UpdateAddress,
    SelectShippingOption,
}

/// Serializable form of a [`CheckoutError`], carried to the parent frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<StepType>,
}

impl ErrorReport {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            step: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("failed to load checkout: {0}")]
    DataLoad(String),
    #[error("{operation:?} failed: {message}")]
    StepOperation {
        operation: StepOperation,
        message: String,
    },
    #[error("order submission failed: {0}")]
    OrderSubmission(String),
    #[error("unhandled error in {step} step: {message}")]
    UnhandledStep { step: StepType, message: String },
    #[error("embedded messaging failed: {0}")]
    EmbeddedMessaging(String),
}

impl CheckoutError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckoutError::DataLoad(_) => ErrorKind::DataLoad,
            CheckoutError::StepOperation { .. } => ErrorKind::StepOperation,
            CheckoutError::OrderSubmission(_) => ErrorKind::OrderSubmission,
            CheckoutError::UnhandledStep { .. } => ErrorKind::UnhandledStep,
            CheckoutError::EmbeddedMessaging(_) => ErrorKind::EmbeddedMessaging,
        }
    }

    pub fn step(&self) -> Option<StepType> {
        match self {
            CheckoutError::UnhandledStep { step, .. } => Some(*step),
            CheckoutError::OrderSubmission(_) => Some(StepType::Payment),
            _ => None,
        }
    }
}

impl From<&CheckoutError> for ErrorReport {
    fn from(value: &CheckoutError) -> Self {
        Self {
            kind: value.kind(),
            message: value.to_string(),
            step: value.step(),
        }
    }
}
