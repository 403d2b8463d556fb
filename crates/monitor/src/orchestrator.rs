use chrono::Local;
use emg_config::MonitorConfig;
use emg_core::{Frame, LinkSignal, RenderSink, Result, StatusSink};
use emg_link::{Connection, ConnectionState, Effect, Endpoint, LinkHandle, Transport};
use emg_pipeline::{parse_reading, StatisticsEngine, WindowBuffer};
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Inbound link signals buffered between the transport task and the loop.
const LINK_QUEUE: usize = 64;

/// One monitoring session: connection in, window + statistics, sinks out.
///
/// All state is owned here and only touched from [`run`](Self::run)'s single
/// dispatch loop; sinks see owned [`Frame`]s and never the buffer itself.
pub struct Orchestrator<R, S> {
    window:     WindowBuffer,
    stats:      StatisticsEngine,
    connection: Connection,
    render:     R,
    status:     S,
}

impl<R: RenderSink, S: StatusSink> Orchestrator<R, S> {
    pub fn new(
        window: WindowBuffer,
        stats: StatisticsEngine,
        connection: Connection,
        render: R,
        status: S,
    ) -> Self {
        Self {
            window,
            stats,
            connection,
            render,
            status,
        }
    }

    /// Build a session from validated configuration.  Fails fast on a zero
    /// capacity or a malformed endpoint URL.
    pub fn from_config(config: &MonitorConfig, render: R, status: S) -> Result<Self> {
        config.validate()?;

        let endpoint = Endpoint::parse(
            &config.endpoint.url,
            &config.endpoint.path,
            &config.endpoint.event,
        )?;
        let window = WindowBuffer::new(config.window.capacity)?;
        let connection = Connection::new(endpoint, &config.reconnect);

        Ok(Self::new(window, StatisticsEngine::new(), connection, render, status))
    }

    pub fn window(&self) -> &WindowBuffer {
        &self.window
    }

    pub fn stats(&self) -> &StatisticsEngine {
        &self.stats
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Apply one raw reading: parse, append, observe, render.
    ///
    /// Malformed input is dropped with a warning and leaves every counter
    /// untouched.
    pub fn ingest(&mut self, raw: &str) -> Option<Frame> {
        let value = match parse_reading(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Dropping reading: {e}");
                return None;
            }
        };

        let latest = self.window.append(value);
        let summary = self.stats.observe(value);
        let frame = Frame {
            latest,
            window: self.window.snapshot(),
            summary,
            received_at: Local::now(),
        };

        self.render.render(&frame);
        Some(frame)
    }

    /// Drive the session until `shutdown` resolves, then stop the connection.
    ///
    /// Also returns once a bounded reconnect budget is spent and the
    /// connection has fallen back to `Disconnected`.
    ///
    /// Link signals, retry deadlines and shutdown are handled one at a time in
    /// arrival order; nothing else mutates the session meanwhile.
    pub async fn run<T, F>(&mut self, transport: &T, shutdown: F)
    where
        T: Transport,
        F: Future<Output = ()>,
    {
        let (tx, mut rx) = mpsc::channel(LINK_QUEUE);
        let mut link = LinkSlot::new(tx);
        tokio::pin!(shutdown);

        let effects = self.connection.start();
        self.apply(effects, transport, &mut link);

        loop {
            if self.connection.state() == ConnectionState::Disconnected {
                info!("Link closed for good; ending session");
                break;
            }

            let retry_at = self.connection.retry_deadline();

            tokio::select! {
                biased;

                () = &mut shutdown => break,

                Some(signal) = rx.recv() => {
                    let LinkSignal { generation, event } = signal;
                    let effects = self.connection.on_link(generation, event, Instant::now());
                    self.apply(effects, transport, &mut link);
                }

                () = sleep_until(retry_at.unwrap_or_else(Instant::now)), if retry_at.is_some() => {
                    let effects = self.connection.on_retry_due(Instant::now());
                    self.apply(effects, transport, &mut link);
                }
            }
        }

        let effects = self.connection.stop();
        self.apply(effects, transport, &mut link);
        link.hangup();
    }

    fn apply<T: Transport>(&mut self, effects: Vec<Effect>, transport: &T, link: &mut LinkSlot) {
        for effect in effects {
            match effect {
                Effect::Dial { generation } => {
                    link.hangup();
                    debug!(generation, "Opening link");
                    let handle = transport.open(
                        self.connection.endpoint(),
                        self.connection.connect_timeout(),
                        LinkHandle::new(generation, link.tx.clone()),
                    );
                    link.current = Some(handle);
                }
                Effect::Hangup => link.hangup(),
                Effect::Status(connected) => self.status.set_connected(connected),
                Effect::Deliver(payload) => {
                    self.ingest(&payload);
                }
            }
        }
    }
}

/// The in-flight transport task, if any, plus the sender new attempts get.
struct LinkSlot {
    tx:      mpsc::Sender<LinkSignal>,
    current: Option<JoinHandle<()>>,
}

impl LinkSlot {
    fn new(tx: mpsc::Sender<LinkSignal>) -> Self {
        Self { tx, current: None }
    }

    fn hangup(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.abort();
        }
    }
}
