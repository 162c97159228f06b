//! Replays a recorded sequence of shopper and step events against a session.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use checkout_core::{
    CheckoutLoader, FileCheckoutLoader, LoadCheckoutRequest, NavigationIntent, SessionEvent,
};
use serde::Deserialize;
use shared::{
    domain::{CheckoutId, StepType},
    error::StepOperation,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptStep {
    Navigate {
        intent: NavigationIntent,
    },
    /// Refreshed checkout data, read from a recorded snapshot file.
    Snapshot {
        path: PathBuf,
    },
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
    OrderFailed {
        message: String,
    },
    FrameMessage {
        raw: String,
        origin: String,
    },
    Wait {
        ms: u64,
    },
}

pub fn parse_script(raw: &str) -> Result<Vec<ScriptStep>> {
    serde_json::from_str(raw).context("malformed checkout script")
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    parse_script(&raw)
}

/// Feeds `steps` into the session queue, waits `settle` for pending views,
/// then asks the session to tear down. Teardown is sent even when a step
/// fails so the session loop always ends.
pub async fn play(
    steps: Vec<ScriptStep>,
    checkout_id: CheckoutId,
    events: UnboundedSender<SessionEvent>,
    settle: Duration,
) -> Result<()> {
    let result = replay(steps, &checkout_id, &events).await;
    if result.is_ok() {
        tokio::time::sleep(settle).await;
    }
    if events.send(SessionEvent::Teardown).is_err() {
        debug!("checkout session already stopped");
    }
    result
}

async fn replay(
    steps: Vec<ScriptStep>,
    checkout_id: &CheckoutId,
    events: &UnboundedSender<SessionEvent>,
) -> Result<()> {
    info!(steps = steps.len(), "replaying checkout script");
    for step in steps {
        debug!(?step, "script step");
        let event = match step {
            ScriptStep::Wait { ms } => {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                continue;
            }
            ScriptStep::Snapshot { path } => {
                let request = LoadCheckoutRequest::new(checkout_id.clone());
                let snapshot = FileCheckoutLoader::new(path).load_checkout(&request).await?;
                SessionEvent::SnapshotLoaded(snapshot)
            }
            ScriptStep::Navigate { intent } => SessionEvent::Intent(intent),
            ScriptStep::StepFailed { operation, message } => {
                SessionEvent::StepFailed { operation, message }
            }
            ScriptStep::UnhandledError { step, message } => {
                SessionEvent::UnhandledError { step, message }
            }
            ScriptStep::OrderSubmitted => SessionEvent::OrderSubmitted,
            ScriptStep::OrderFinalized => SessionEvent::OrderFinalized,
            ScriptStep::OrderFailed { message } => SessionEvent::OrderFailed(message),
            ScriptStep::FrameMessage { raw, origin } => SessionEvent::FrameMessage { raw, origin },
        };
        events
            .send(event)
            .context("checkout session stopped before the script finished")?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/script_tests.rs"]
mod tests;
