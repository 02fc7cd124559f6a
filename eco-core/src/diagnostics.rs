//! Side channel for failures that were swallowed and replaced by defaults.
//!
//! The map flow never shows "could not load" to the user. Every failure it
//! degrades is still logged and broadcast here so front ends and tests can
//! observe it.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Which operation degraded.
pub enum DiagnosticKind {
    /// Recycling points were replaced by an empty list.
    RecyclingFetch,
    /// A route was replaced by the straight-line fallback.
    RouteFallback,
    /// Navigation stopped because no position was available.
    LocationUnavailable,
}

#[derive(Debug, Clone)]
/// A suppressed failure.
pub struct Diagnostic {
    /// When it happened.
    pub at: DateTime<Utc>,
    /// Operation that degraded.
    pub kind: DiagnosticKind,
    /// Human-readable cause.
    pub message: String,
}

#[derive(Debug, Clone)]
/// Broadcast sender for diagnostics. Cloning shares the channel.
pub struct Diagnostics {
    sender: broadcast::Sender<Diagnostic>,
}

impl Diagnostics {
    /// Create a channel with no subscribers yet.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _receiver) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Subscribe to diagnostics published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Diagnostic> {
        self.sender.subscribe()
    }

    /// Publish a diagnostic. Having no subscriber is fine.
    pub fn publish(&self, kind: DiagnosticKind, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            at: Utc::now(),
            kind,
            message: message.into(),
        };
        if self.sender.send(diagnostic).is_err() {
            tracing::trace!(?kind, "diagnostic dropped, no subscriber");
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}
