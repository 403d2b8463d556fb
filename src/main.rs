//! emg: live EMG sensor monitor.
//!
//! Run with:  `RUST_LOG=info emg`  (config: `$EMG_CONFIG` or `~/.config/emg/emg.toml`)

use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (default: info).  Logs go to stderr; stdout
    // carries the chart.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("emg v{} starting", env!("CARGO_PKG_VERSION"));

    emg_monitor::run().await.map_err(Into::into)
}
