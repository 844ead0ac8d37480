//! # Event Emitter
//!
//! The "publish to external bus" half of component F (spec §4.6). Emission
//! is best-effort: a failure here is logged and swallowed, it must never roll
//! back the state transition it accompanies (spec §4.6 invariant).

use async_trait::async_trait;

use crate::models::Event;

#[async_trait]
pub trait EventEmitter: Send + Sync {
    async fn emit(&self, event: &Event);
}

/// Default emitter when no bus topic is configured (spec §6: "skipped
/// entirely when unset"). Logs at debug so the journal write is still
/// traceable without a live bus.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEmitter;

#[async_trait]
impl EventEmitter for NoopEmitter {
    async fn emit(&self, event: &Event) {
        tracing::debug!(event_id = %event.kf_id, "bus emission skipped, no topic configured");
    }
}

/// Forwards events onto an in-process channel. Used by the orchestrator to
/// bridge the journal into whatever bus client it wires up, and by tests that
/// want to assert on emitted events without standing up a real bus.
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
    sender: tokio::sync::mpsc::UnboundedSender<Event>,
}

impl ChannelEmitter {
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<Event>) {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl EventEmitter for ChannelEmitter {
    async fn emit(&self, event: &Event) {
        if self.sender.send(event.clone()).is_err() {
            tracing::warn!(event_id = %event.kf_id, "event emitter channel has no receiver");
        }
    }
}
