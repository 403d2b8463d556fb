/// Lifecycle and data events produced by one transport attempt.
///
/// Sources:
/// - Transport task → `Opened`, `Failed`, `Lost`, `Message`
///
/// A single attempt emits at most one `Opened` and at most one terminal event
/// (`Failed` before `Opened`, `Lost` after it).
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    // ── Lifecycle ─────────────────────────────────────────────────────────────
    /// Handshake completed; the channel is ready to deliver readings.
    Opened,
    /// The attempt never reached `Opened` (dial error, timeout, refused handshake).
    Failed(String),
    /// An open channel went away (server close, I/O error, heartbeat timeout).
    Lost(String),

    // ── Data ──────────────────────────────────────────────────────────────────
    /// One inbound reading, still in its raw textual form.
    Message(String),
}

impl LinkEvent {
    /// `true` for the events that end an attempt.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Lost(_))
    }
}

/// A [`LinkEvent`] tagged with the attempt that produced it.
///
/// The generation lets the connection discard events from attempts it has
/// already abandoned (for example after `stop()`).
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSignal {
    pub generation: u64,
    pub event:      LinkEvent,
}
