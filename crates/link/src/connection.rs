use crate::{backoff::Backoff, endpoint::Endpoint};
use emg_config::ReconnectPolicy;
use emg_core::LinkEvent;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// Visible lifecycle of the realtime channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Work the driver must perform after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Open a new transport attempt tagged with `generation`.
    Dial { generation: u64 },
    /// Tear down the current transport attempt, if any.
    Hangup,
    /// Connected indicator changed.
    Status(bool),
    /// Forward one raw reading to the pipeline.
    Deliver(String),
}

/// Reconnecting channel state machine.
///
/// Performs no I/O: transport signals and timer expiries go in, [`Effect`]s come
/// out.  Each dial gets a fresh generation; signals carrying any other
/// generation belong to an abandoned attempt and are ignored.
#[derive(Debug)]
pub struct Connection {
    endpoint:   Endpoint,
    timeout:    Duration,
    state:      ConnectionState,
    backoff:    Backoff,
    generation: u64,
    retry_at:   Option<Instant>,
}

impl Connection {
    pub fn new(endpoint: Endpoint, policy: &ReconnectPolicy) -> Self {
        Self::with_backoff(endpoint, Backoff::from_policy(policy), policy.timeout())
    }

    pub fn with_backoff(endpoint: Endpoint, backoff: Backoff, timeout: Duration) -> Self {
        Self {
            endpoint,
            timeout,
            state: ConnectionState::Disconnected,
            backoff,
            generation: 0,
            retry_at: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Budget for one dial plus handshake.
    pub fn connect_timeout(&self) -> Duration {
        self.timeout
    }

    /// Generation of the current (or most recent) attempt.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// When the pending retry is due, if one is scheduled.
    pub fn retry_deadline(&self) -> Option<Instant> {
        self.retry_at
    }

    /// Begin connecting.  No-op unless currently disconnected.
    pub fn start(&mut self) -> Vec<Effect> {
        if self.state != ConnectionState::Disconnected {
            return Vec::new();
        }

        info!("Connecting to {}", self.endpoint.url());
        self.state = ConnectionState::Connecting;
        self.backoff.reset();
        vec![self.dial()]
    }

    /// End the session.  Cancels any pending retry; no-op when already
    /// disconnected.
    pub fn stop(&mut self) -> Vec<Effect> {
        if self.state == ConnectionState::Disconnected {
            return Vec::new();
        }

        let was_connected = self.is_connected();
        self.enter_disconnected();
        info!("Connection to {} stopped", self.endpoint.url());

        let mut effects = vec![Effect::Hangup];
        if was_connected {
            effects.push(Effect::Status(false));
        }
        effects
    }

    /// Fire the pending retry if its deadline has passed.
    pub fn on_retry_due(&mut self, now: Instant) -> Vec<Effect> {
        match self.retry_at {
            Some(at) if at <= now && self.state == ConnectionState::Connecting => {
                self.retry_at = None;
                debug!(attempt = self.backoff.attempts(), "Retrying connection");
                vec![self.dial()]
            }
            _ => Vec::new(),
        }
    }

    /// Apply one transport signal from attempt `generation`.
    pub fn on_link(&mut self, generation: u64, event: LinkEvent, now: Instant) -> Vec<Effect> {
        if generation != self.generation {
            trace!(generation, current = self.generation, "Ignoring signal from stale attempt");
            return Vec::new();
        }

        match (self.state, event) {
            (ConnectionState::Connecting, LinkEvent::Opened) => {
                info!("Connected to {}", self.endpoint.url());
                self.state = ConnectionState::Connected;
                self.retry_at = None;
                self.backoff.reset();
                vec![Effect::Status(true)]
            }
            (ConnectionState::Connected, LinkEvent::Message(payload)) => {
                vec![Effect::Deliver(payload)]
            }
            (ConnectionState::Connecting, LinkEvent::Failed(reason) | LinkEvent::Lost(reason)) => {
                warn!("Connection attempt failed: {reason}");
                self.schedule_retry(now);
                Vec::new()
            }
            (ConnectionState::Connected, LinkEvent::Lost(reason) | LinkEvent::Failed(reason)) => {
                warn!("Connection lost: {reason}");
                self.state = ConnectionState::Connecting;
                self.schedule_retry(now);
                vec![Effect::Status(false)]
            }
            (state, LinkEvent::Message(_)) => {
                debug!(?state, "Dropping message received while not connected");
                Vec::new()
            }
            (state, event) => {
                trace!(?state, ?event, "Ignoring link event");
                Vec::new()
            }
        }
    }

    fn dial(&mut self) -> Effect {
        self.generation += 1;
        Effect::Dial {
            generation: self.generation,
        }
    }

    fn schedule_retry(&mut self, now: Instant) {
        match self.backoff.next_delay() {
            Some(delay) => {
                info!("Reconnecting in {delay:?}");
                self.retry_at = Some(now + delay);
            }
            None => {
                warn!(
                    attempts = self.backoff.attempts(),
                    "Reconnect attempts exhausted; giving up"
                );
                self.enter_disconnected();
            }
        }
    }

    fn enter_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.retry_at = None;
        // Invalidate whatever attempt is still in flight.
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> Connection {
        let endpoint = Endpoint::parse("http://localhost:5000", "/socket.io/", "emg_data").unwrap();
        let backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(5));
        Connection::with_backoff(endpoint, backoff, Duration::from_secs(20))
    }

    /// Start and complete the first dial.
    fn connected(now: Instant) -> Connection {
        let mut conn = connection();
        conn.start();
        let generation = conn.generation();
        assert_eq!(conn.on_link(generation, LinkEvent::Opened, now), vec![Effect::Status(true)]);
        conn
    }

    fn dialed(effects: Vec<Effect>) -> u64 {
        match effects.as_slice() {
            [Effect::Dial { generation }] => *generation,
            other => panic!("expected a single dial, got {other:?}"),
        }
    }

    #[test]
    fn start_dials_once() {
        let mut conn = connection();
        assert_eq!(conn.start(), vec![Effect::Dial { generation: 1 }]);
        assert_eq!(conn.state(), ConnectionState::Connecting);
        assert!(conn.start().is_empty());
    }

    #[test]
    fn failed_attempt_schedules_retry_without_status() {
        let now = Instant::now();
        let mut conn = connection();
        conn.start();

        let effects = conn.on_link(1, LinkEvent::Failed("refused".into()), now);
        assert!(effects.is_empty());
        assert_eq!(conn.state(), ConnectionState::Connecting);
        assert_eq!(conn.retry_deadline(), Some(now + Duration::from_secs(1)));

        assert!(conn.on_retry_due(now).is_empty(), "not due yet");
        let effects = conn.on_retry_due(now + Duration::from_secs(1));
        assert_eq!(effects, vec![Effect::Dial { generation: 2 }]);
        assert_eq!(conn.retry_deadline(), None);
    }

    #[test]
    fn retry_delays_grow_and_cap() {
        let mut now = Instant::now();
        let mut conn = connection();
        conn.start();

        let mut delays = Vec::new();
        for _ in 0..5 {
            conn.on_link(conn.generation(), LinkEvent::Failed("down".into()), now);
            let due = conn.retry_deadline().unwrap();
            delays.push(due - now);
            now = due;
            conn.on_retry_due(now);
        }

        let secs: Vec<u64> = delays.iter().map(Duration::as_secs).collect();
        assert_eq!(secs, vec![1, 2, 4, 5, 5]);
    }

    #[test]
    fn loss_then_reconnect_toggles_status() {
        let now = Instant::now();
        let mut conn = connected(now);

        let effects = conn.on_link(conn.generation(), LinkEvent::Lost("transport close".into()), now);
        assert_eq!(effects, vec![Effect::Status(false)]);
        assert_eq!(conn.state(), ConnectionState::Connecting);

        let later = now + Duration::from_secs(1);
        let generation = dialed(conn.on_retry_due(later));
        assert_eq!(conn.on_link(generation, LinkEvent::Opened, later), vec![Effect::Status(true)]);
        assert!(conn.is_connected());
    }

    #[test]
    fn successful_connect_resets_backoff() {
        let now = Instant::now();
        let mut conn = connection();
        conn.start();
        conn.on_link(1, LinkEvent::Failed("x".into()), now);
        conn.on_retry_due(now + Duration::from_secs(1));
        conn.on_link(2, LinkEvent::Failed("x".into()), now);
        conn.on_retry_due(now + Duration::from_secs(3));
        conn.on_link(3, LinkEvent::Opened, now);

        conn.on_link(3, LinkEvent::Lost("x".into()), now);
        assert_eq!(conn.retry_deadline(), Some(now + Duration::from_secs(1)));
    }

    #[test]
    fn messages_only_flow_while_connected() {
        let now = Instant::now();
        let mut conn = connection();
        conn.start();
        assert!(conn.on_link(1, LinkEvent::Message("3.0".into()), now).is_empty());

        conn.on_link(1, LinkEvent::Opened, now);
        assert_eq!(
            conn.on_link(1, LinkEvent::Message("3.0".into()), now),
            vec![Effect::Deliver("3.0".into())]
        );

        conn.on_link(1, LinkEvent::Lost("gone".into()), now);
        assert!(conn.on_link(1, LinkEvent::Message("4.0".into()), now).is_empty());
    }

    #[test]
    fn stop_while_disconnected_is_noop() {
        let mut conn = connection();
        assert!(conn.stop().is_empty());
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn stop_while_connecting_cancels_retry() {
        let now = Instant::now();
        let mut conn = connection();
        conn.start();
        conn.on_link(1, LinkEvent::Failed("refused".into()), now);
        assert!(conn.retry_deadline().is_some());

        assert_eq!(conn.stop(), vec![Effect::Hangup]);
        assert_eq!(conn.retry_deadline(), None);
        assert!(conn.on_retry_due(now + Duration::from_secs(60)).is_empty());

        // A late signal from the abandoned attempt changes nothing.
        assert!(conn.on_link(1, LinkEvent::Opened, now).is_empty());
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn stop_while_connected_reports_disconnect() {
        let now = Instant::now();
        let mut conn = connected(now);
        assert_eq!(conn.stop(), vec![Effect::Hangup, Effect::Status(false)]);
        assert!(conn.stop().is_empty());
    }

    #[test]
    fn restart_after_stop_uses_fresh_generation() {
        let now = Instant::now();
        let mut conn = connected(now);
        let old = conn.generation();
        conn.stop();

        let generation = dialed(conn.start());
        assert!(generation > old);
        assert!(conn.on_link(old, LinkEvent::Message("1".into()), now).is_empty());
    }

    #[test]
    fn bounded_policy_gives_up() {
        let now = Instant::now();
        let endpoint = Endpoint::parse("http://localhost:5000", "/socket.io/", "emg_data").unwrap();
        let backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(5))
            .with_max_attempts(Some(1));
        let mut conn = Connection::with_backoff(endpoint, backoff, Duration::from_secs(20));

        conn.start();
        conn.on_link(1, LinkEvent::Failed("x".into()), now);
        conn.on_retry_due(now + Duration::from_secs(1));
        conn.on_link(2, LinkEvent::Failed("x".into()), now);

        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert_eq!(conn.retry_deadline(), None);
    }
}
