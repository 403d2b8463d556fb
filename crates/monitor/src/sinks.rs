//! Terminal render and status sinks used by the `emg` binary.

use emg_config::RenderConfig;
use emg_core::{Frame, RenderSink, StatusSink, WindowSnapshot};
use std::io::{self, Write};
use tracing::{debug, info, warn};

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Single-line chart redrawn in place on every frame.
#[derive(Debug)]
pub struct TerminalChart<W = io::Stdout> {
    out:       W,
    precision: usize,
    sparkline: bool,
}

impl TerminalChart<io::Stdout> {
    pub fn stdout(config: &RenderConfig) -> Self {
        Self::new(io::stdout(), config)
    }
}

impl<W: Write> TerminalChart<W> {
    pub fn new(out: W, config: &RenderConfig) -> Self {
        Self {
            out,
            precision: config.precision,
            sparkline: config.sparkline,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Text of one redraw, without the line-clearing prefix.
    pub fn format_frame(&self, frame: &Frame) -> String {
        let p = self.precision;
        let mut line = format!(
            "{} #{:<6} value {:>8.p$}  peak {:>8.p$}  mean {:>8.p$}",
            frame.received_at.format("%H:%M:%S%.3f"),
            frame.latest.label(),
            frame.latest.value,
            frame.summary.peak,
            frame.summary.mean,
        );
        if self.sparkline {
            line.push_str("  ");
            line.push_str(&sparkline(&frame.window));
        }
        line
    }
}

impl<W: Write> RenderSink for TerminalChart<W> {
    fn render(&mut self, frame: &Frame) {
        let line = self.format_frame(frame);
        // Carriage return + clear line: redraw in place, no scrolling.
        let written = write!(self.out, "\r\x1b[2K{line}").and_then(|()| self.out.flush());
        if let Err(e) = written {
            debug!("Chart redraw failed: {e}");
        }
    }
}

/// Render the window as a block sparkline scaled to its own value range.
pub fn sparkline(window: &WindowSnapshot) -> String {
    let Some((lo, hi)) = window.value_range() else {
        return String::new();
    };
    let span = hi - lo;
    let top = SPARK_LEVELS.len() - 1;

    window
        .readings()
        .iter()
        .map(|r| {
            if span <= f64::EPSILON {
                return SPARK_LEVELS[top / 2];
            }
            let level = ((r.value - lo) / span * top as f64).round() as usize;
            SPARK_LEVELS[level.min(top)]
        })
        .collect()
}

/// Connected / disconnected indicator printed on its own line.
#[derive(Debug)]
pub struct StatusIndicator<W = io::Stdout> {
    out:       W,
    connected: bool,
}

impl StatusIndicator<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> StatusIndicator<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            connected: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print the current state without a transition, e.g. before the first
    /// connection attempt resolves.
    pub fn show(&mut self) {
        let label = if self.connected { "● Connected" } else { "○ Disconnected" };
        let written = writeln!(self.out, "\r\x1b[2K{label}").and_then(|()| self.out.flush());
        if let Err(e) = written {
            debug!("Status redraw failed: {e}");
        }
    }
}

impl<W: Write> StatusSink for StatusIndicator<W> {
    fn set_connected(&mut self, connected: bool) {
        self.connected = connected;

        if connected {
            info!("Status: connected");
        } else {
            warn!("Status: disconnected");
        }
        self.show();
    }
}
