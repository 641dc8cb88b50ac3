//! Turn lifecycle events
//!
//! The orchestrator reports progress through a [`DisplayHandler`]. Handlers are
//! synchronous and must return quickly; the CLI renders a spinner, library
//! callers can log or ignore events.

use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Something that happened while serving a turn
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A request is about to be looked up or dispatched
    Started {
        conversation_id: String,
        model: String,
    },
    /// A cached response answered the request
    CacheHit {
        conversation_id: String,
        fingerprint: String,
    },
    /// A response was registered into the conversation
    Completed {
        conversation_id: String,
        duration_ms: u64,
        input_tokens: u32,
        output_tokens: u32,
    },
    /// The turn failed; nothing was registered
    Failed {
        conversation_id: String,
        error: String,
    },
    /// A retryable provider error will be retried after `delay`
    Retrying {
        conversation_id: String,
        attempt: u32,
        delay: Duration,
        reason: String,
    },
}

impl ProgressEvent {
    pub fn conversation_id(&self) -> &str {
        match self {
            Self::Started { conversation_id, .. }
            | Self::CacheHit { conversation_id, .. }
            | Self::Completed { conversation_id, .. }
            | Self::Failed { conversation_id, .. }
            | Self::Retrying { conversation_id, .. } => conversation_id,
        }
    }

    /// Whether the turn is over
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}

/// Receives lifecycle events
pub trait DisplayHandler: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

/// Ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl DisplayHandler for NullDisplay {
    fn on_event(&self, _event: &ProgressEvent) {}
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDisplay;

impl DisplayHandler for TracingDisplay {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started {
                conversation_id,
                model,
            } => debug!(conversation_id = %conversation_id, model = %model, "turn started"),
            ProgressEvent::CacheHit {
                conversation_id,
                fingerprint,
            } => info!(conversation_id = %conversation_id, fingerprint = %fingerprint, "served from cache"),
            ProgressEvent::Completed {
                conversation_id,
                duration_ms,
                input_tokens,
                output_tokens,
            } => info!(
                conversation_id = %conversation_id,
                duration_ms,
                input_tokens,
                output_tokens,
                "turn completed"
            ),
            ProgressEvent::Failed {
                conversation_id,
                error,
            } => warn!(conversation_id = %conversation_id, error = %error, "turn failed"),
            ProgressEvent::Retrying {
                conversation_id,
                attempt,
                delay,
                reason,
            } => warn!(
                conversation_id = %conversation_id,
                attempt,
                delay_ms = delay.as_millis() as u64,
                reason = %reason,
                "retrying provider call"
            ),
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl DisplayHandler for RecordingDisplay {
    fn on_event(&self, event: &ProgressEvent) {
        self.events.lock().push(event.clone());
    }
}
