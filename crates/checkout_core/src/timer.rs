//! Deferred step-view tracking.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
    time::Duration,
};

use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};
use tracing::{debug, warn};

use crate::session::SessionEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Host timer facility. A scheduled timer reports back through
/// [`SessionEvent::TimerFired`] unless cancelled first.
pub trait ViewScheduler: Send + Sync {
    fn schedule(&self, delay: Duration) -> TimerId;
    fn cancel(&self, id: TimerId);
}

pub struct TokioViewScheduler {
    events: UnboundedSender<SessionEvent>,
    next_id: AtomicU64,
    pending: Mutex<HashMap<TimerId, JoinHandle<()>>>,
}

impl TokioViewScheduler {
    pub fn new(events: UnboundedSender<SessionEvent>) -> Self {
        Self {
            events,
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }
}

impl ViewScheduler for TokioViewScheduler {
    fn schedule(&self, delay: Duration) -> TimerId {
        let id = TimerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if events.send(SessionEvent::TimerFired(id)).is_err() {
                debug!(%id, "session closed before view timer fired");
            }
        });

        match self.pending.lock() {
            Ok(mut pending) => {
                pending.retain(|_, task| !task.is_finished());
                pending.insert(id, handle);
            }
            Err(_) => warn!(%id, "view timer registry poisoned; timer cannot be cancelled"),
        }
        id
    }

    fn cancel(&self, id: TimerId) {
        let handle = match self.pending.lock() {
            Ok(mut pending) => pending.remove(&id),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            handle.abort();
            debug!(%id, "view timer cancelled");
        }
    }
}

#[cfg(test)]
#[path = "tests/timer_tests.rs"]
mod tests;
