use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Engine.IO pong frame, sent in reply to every server ping.
pub const PONG: &str = "3";

/// Engine.IO v4 / Socket.IO v5 packets received over the WebSocket.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    // ── Engine.IO ─────────────────────────────────────────────────────────────
    /// Session opened; carries heartbeat timing.
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Noop,

    // ── Socket.IO ─────────────────────────────────────────────────────────────
    /// Namespace join acknowledged.
    Connect { namespace: String },
    /// Server removed us from the namespace.
    Disconnect { namespace: String },
    /// Named event with its JSON arguments.
    Event {
        namespace: String,
        name:      String,
        args:      Vec<Value>,
    },
    /// Namespace join refused.
    ConnectError { namespace: String, message: String },

    /// A frame we do not handle; carries the raw text for debugging.
    Unknown(String),
}

/// Body of the Engine.IO open packet (`0{...}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid:           String,
    #[serde(default = "default_ping_interval")]
    pub ping_interval: u64,
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout:  u64,
}

fn default_ping_interval() -> u64 {
    25_000
}

fn default_ping_timeout() -> u64 {
    20_000
}

impl Handshake {
    /// Longest silence tolerated before the session is considered dead.
    #[must_use]
    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.ping_interval + self.ping_timeout)
    }
}

/// Parse one WebSocket text frame into a typed [`Packet`].
///
/// Engine.IO frames start with a type digit; message frames (`4`) wrap a
/// Socket.IO packet of the form `<type>[/namespace,][ack id][json]`.
pub fn parse_packet(frame: &str) -> Packet {
    let Some(kind) = frame.chars().next() else {
        return Packet::Unknown(String::new());
    };
    let body = &frame[kind.len_utf8()..];

    match kind {
        '0' => serde_json::from_str(body)
            .map(Packet::Open)
            .unwrap_or_else(|_| Packet::Unknown(frame.to_string())),
        '1' => Packet::Close,
        '2' => Packet::Ping,
        '3' => Packet::Pong,
        '4' => parse_socket_packet(body).unwrap_or_else(|| Packet::Unknown(frame.to_string())),
        '6' => Packet::Noop,
        _ => Packet::Unknown(frame.to_string()),
    }
}

fn parse_socket_packet(body: &str) -> Option<Packet> {
    let kind = body.chars().next()?;
    let (namespace, rest) = split_namespace(&body[kind.len_utf8()..]);

    match kind {
        '0' => Some(Packet::Connect { namespace }),
        '1' => Some(Packet::Disconnect { namespace }),
        '2' => {
            // Skip the optional ack id.
            let json = rest.trim_start_matches(|c: char| c.is_ascii_digit());
            let mut items: Vec<Value> = serde_json::from_str(json).ok()?;
            if items.is_empty() {
                return None;
            }
            match items.remove(0) {
                Value::String(name) => Some(Packet::Event {
                    namespace,
                    name,
                    args: items,
                }),
                _ => None,
            }
        }
        '4' => {
            let message = match serde_json::from_str::<Value>(rest) {
                Ok(Value::Object(map)) => map
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| rest.to_string()),
                Ok(Value::String(s)) => s,
                _ => rest.to_string(),
            };
            Some(Packet::ConnectError { namespace, message })
        }
        _ => None,
    }
}

/// Split a leading `/namespace,` off a Socket.IO packet body.
fn split_namespace(s: &str) -> (String, &str) {
    if !s.starts_with('/') {
        return ("/".to_string(), s);
    }
    match s.split_once(',') {
        Some((ns, rest)) => (ns.to_string(), rest),
        None => (s.to_string(), ""),
    }
}

/// Socket.IO namespace-join frame for `namespace`.
pub fn connect_frame(namespace: &str) -> String {
    if namespace == "/" {
        "40".to_string()
    } else {
        format!("40{namespace},")
    }
}

/// Raw textual form of an event's first argument.
///
/// Strings pass through untouched, numbers keep their JSON spelling; anything
/// else is rendered as JSON and left for the reading parser to reject.
pub fn payload_text(arg: Option<&Value>) -> String {
    match arg {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
