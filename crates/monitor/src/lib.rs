//! Live EMG monitor session.
//!
//! Wires the pieces together:
//! - Socket.IO link (reconnecting connection state machine + WebSocket transport)
//! - Window buffer and lifetime statistics
//! - Terminal chart and status indicator

pub mod orchestrator;
pub mod sinks;

pub use orchestrator::Orchestrator;
pub use sinks::{sparkline, StatusIndicator, TerminalChart};

use emg_config::{default_path, load as load_config};
use emg_core::Result;
use emg_link::SocketIoTransport;
use tracing::{error, info};

// ── Entry point ───────────────────────────────────────────────────────────────

/// Load configuration, run one session until Ctrl-C, then disconnect.
///
/// Configuration errors are returned before any connection is attempted.
pub async fn run() -> Result<()> {
    let config = load_config(default_path())?;

    let mut status = StatusIndicator::stdout();
    status.show();

    let mut monitor =
        Orchestrator::from_config(&config, TerminalChart::stdout(&config.render), status)?;

    info!(
        capacity = config.window.capacity,
        endpoint = %config.endpoint.url,
        event = %config.endpoint.event,
        "Starting EMG monitor"
    );

    monitor.run(&SocketIoTransport, shutdown_signal()).await;

    info!(
        readings = monitor.stats().count(),
        "Session ended"
    );
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Resolves on Ctrl-C.  If the signal handler can't be installed the session
/// simply runs until the process is killed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
