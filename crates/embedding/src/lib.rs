//! Messaging bridge between an embedded checkout and the page hosting it.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use anyhow::{anyhow, Context, Result};
use shared::{
    error::ErrorReport,
    protocol::{InboundMessage, OutboundMessage, StyleOverrides},
};
use tracing::{debug, warn};

/// Raw transport to the parent browsing context (`window.parent.postMessage`).
pub trait ParentFrame: Send + Sync {
    fn post_message(&self, message: &str, target_origin: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedOptions {
    pub parent_origin: String,
}

pub type StyleHandler = Box<dyn Fn(&StyleOverrides) + Send + Sync>;

pub trait EmbeddedMessenger: Send + Sync {
    fn post_frame_loaded(&self, content_id: &str) -> Result<()>;
    fn post_complete(&self) -> Result<()>;
    fn post_error(&self, error: &ErrorReport) -> Result<()>;
    fn receive_styles(&self, handler: StyleHandler);
    /// Routes a message received from `origin` to the registered handlers.
    fn dispatch_inbound(&self, raw: &str, origin: &str) -> Result<()>;
}

pub fn create_embedded_messenger(
    options: Option<EmbeddedOptions>,
    parent: Arc<dyn ParentFrame>,
) -> Arc<dyn EmbeddedMessenger> {
    match options {
        Some(options) => Arc::new(IframeMessenger::new(parent, options)),
        None => Arc::new(DetachedMessenger),
    }
}

/// Used when the checkout is not hosted inside another page.
pub struct DetachedMessenger;

impl EmbeddedMessenger for DetachedMessenger {
    fn post_frame_loaded(&self, _content_id: &str) -> Result<()> {
        Ok(())
    }

    fn post_complete(&self) -> Result<()> {
        Ok(())
    }

    fn post_error(&self, _error: &ErrorReport) -> Result<()> {
        Ok(())
    }

    fn receive_styles(&self, _handler: StyleHandler) {}

    fn dispatch_inbound(&self, _raw: &str, origin: &str) -> Result<()> {
        debug!(%origin, "ignoring parent message; checkout is not embedded");
        Ok(())
    }
}

pub struct IframeMessenger {
    parent: Arc<dyn ParentFrame>,
    options: EmbeddedOptions,
    frame_loaded_sent: AtomicBool,
    complete_sent: AtomicBool,
    style_handlers: Mutex<Vec<StyleHandler>>,
}

impl IframeMessenger {
    pub fn new(parent: Arc<dyn ParentFrame>, options: EmbeddedOptions) -> Self {
        Self {
            parent,
            options,
            frame_loaded_sent: AtomicBool::new(false),
            complete_sent: AtomicBool::new(false),
            style_handlers: Mutex::new(Vec::new()),
        }
    }

    fn post(&self, message: &OutboundMessage) -> Result<()> {
        let encoded = serde_json::to_string(message).context("failed to encode parent message")?;
        self.parent
            .post_message(&encoded, &self.options.parent_origin)
            .with_context(|| format!("failed to post message to {}", self.options.parent_origin))
    }
}

impl EmbeddedMessenger for IframeMessenger {
    fn post_frame_loaded(&self, content_id: &str) -> Result<()> {
        if self.frame_loaded_sent.swap(true, Ordering::SeqCst) {
            debug!(content_id, "frame loaded already posted");
            return Ok(());
        }
        self.post(&OutboundMessage::FrameLoaded {
            content_id: content_id.to_string(),
        })
    }

    fn post_complete(&self) -> Result<()> {
        if self.complete_sent.swap(true, Ordering::SeqCst) {
            debug!("order complete already posted");
            return Ok(());
        }
        self.post(&OutboundMessage::OrderComplete)
    }

    fn post_error(&self, error: &ErrorReport) -> Result<()> {
        self.post(&OutboundMessage::OrderError {
            error: error.clone(),
        })
    }

    fn receive_styles(&self, handler: StyleHandler) {
        match self.style_handlers.lock() {
            Ok(mut handlers) => handlers.push(handler),
            Err(_) => warn!("style handler registry poisoned; handler dropped"),
        }
    }

    fn dispatch_inbound(&self, raw: &str, origin: &str) -> Result<()> {
        if origin != self.options.parent_origin {
            warn!(
                %origin,
                expected = %self.options.parent_origin,
                "ignoring parent message from unexpected origin"
            );
            return Ok(());
        }

        let message: InboundMessage =
            serde_json::from_str(raw).context("malformed parent frame message")?;
        match message {
            InboundMessage::StyleConfigured(styles) => {
                let handlers = self
                    .style_handlers
                    .lock()
                    .map_err(|_| anyhow!("style handler registry poisoned"))?;
                debug!(targets = styles.len(), handlers = handlers.len(), "applying parent styles");
                for handler in handlers.iter() {
                    handler(&styles);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
