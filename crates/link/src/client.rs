use crate::endpoint::Endpoint;
use crate::packet::{connect_frame, parse_packet, payload_text, Packet, PONG};
use emg_core::{EmgError, LinkEvent, LinkSignal, Result};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Something that can open one attempt of the realtime channel.
///
/// `open` spawns the attempt and returns immediately; everything the attempt
/// observes comes back as [`LinkSignal`]s through `link`.  Aborting the returned
/// handle must tear the attempt down.
pub trait Transport: Send + Sync + 'static {
    fn open(&self, endpoint: &Endpoint, timeout: Duration, link: LinkHandle) -> JoinHandle<()>;
}

/// Sending half handed to one transport attempt.
#[derive(Debug, Clone)]
pub struct LinkHandle {
    generation: u64,
    tx:         mpsc::Sender<LinkSignal>,
}

impl LinkHandle {
    pub fn new(generation: u64, tx: mpsc::Sender<LinkSignal>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Forward `event`; returns `false` once the session has gone away.
    pub async fn send(&self, event: LinkEvent) -> bool {
        let signal = LinkSignal {
            generation: self.generation,
            event,
        };
        self.tx.send(signal).await.is_ok()
    }
}

/// Socket.IO v4 client over a plain WebSocket.
///
/// Each attempt dials, performs the Engine.IO handshake and namespace join
/// within the connect timeout, then streams events named after the endpoint's
/// event until the socket closes or the heartbeat lapses.
#[derive(Debug, Clone, Copy, Default)]
pub struct SocketIoTransport;

impl Transport for SocketIoTransport {
    fn open(&self, endpoint: &Endpoint, timeout: Duration, link: LinkHandle) -> JoinHandle<()> {
        let endpoint = endpoint.clone();

        tokio::spawn(async move {
            let session = match tokio::time::timeout(timeout, handshake(&endpoint)).await {
                Ok(Ok(session)) => session,
                Ok(Err(e)) => {
                    link.send(LinkEvent::Failed(e.to_string())).await;
                    return;
                }
                Err(_) => {
                    link.send(LinkEvent::Failed(format!("timed out after {timeout:?}"))).await;
                    return;
                }
            };

            info!("Socket.IO session established on {}", endpoint.socket_url());
            if !link.send(LinkEvent::Opened).await {
                return; // session dropped
            }

            let reason = stream_events(session, &endpoint, &link).await;
            link.send(LinkEvent::Lost(reason)).await;
        })
    }
}

struct Session {
    socket:    Socket,
    heartbeat: Duration,
}

/// Dial, wait for the Engine.IO open packet, then join the namespace.
async fn handshake(endpoint: &Endpoint) -> Result<Session> {
    debug!("Dialing {}", endpoint.socket_url());
    let (mut socket, _) = connect_async(endpoint.socket_url())
        .await
        .map_err(|e| EmgError::Link(format!("connect: {e}")))?;

    let heartbeat = loop {
        match next_packet(&mut socket).await? {
            Packet::Open(hs) => {
                debug!(sid = %hs.sid, "Engine.IO open");
                break hs.heartbeat();
            }
            Packet::Close => return Err(EmgError::Link("closed during handshake".into())),
            other => trace!(?other, "Ignoring packet before open"),
        }
    };

    send_text(&mut socket, connect_frame(endpoint.namespace())).await?;

    loop {
        match next_packet(&mut socket).await? {
            Packet::Connect { namespace } if namespace == endpoint.namespace() => {
                return Ok(Session { socket, heartbeat });
            }
            Packet::ConnectError { message, .. } => {
                return Err(EmgError::Link(format!(
                    "namespace '{}' refused: {message}",
                    endpoint.namespace()
                )));
            }
            Packet::Ping => send_text(&mut socket, PONG.to_string()).await?,
            Packet::Close => return Err(EmgError::Link("closed during handshake".into())),
            other => trace!(?other, "Ignoring packet before namespace join"),
        }
    }
}

/// Pump inbound packets until the session ends; returns the reason it ended.
async fn stream_events(session: Session, endpoint: &Endpoint, link: &LinkHandle) -> String {
    let Session {
        mut socket,
        heartbeat,
    } = session;

    loop {
        let packet = match tokio::time::timeout(heartbeat, next_packet(&mut socket)).await {
            Ok(Ok(packet)) => packet,
            Ok(Err(e)) => return e.to_string(),
            Err(_) => return format!("no heartbeat for {heartbeat:?}"),
        };

        match packet {
            Packet::Ping => {
                if let Err(e) = send_text(&mut socket, PONG.to_string()).await {
                    return e.to_string();
                }
            }
            Packet::Event {
                namespace,
                name,
                args,
            } if namespace == endpoint.namespace() && name == endpoint.event() => {
                if !link.send(LinkEvent::Message(payload_text(args.first()))).await {
                    let _ = socket.close(None).await;
                    return "session dropped".into();
                }
            }
            Packet::Disconnect { namespace } if namespace == endpoint.namespace() => {
                return "server disconnect".into();
            }
            Packet::Close => return "transport close".into(),
            Packet::Unknown(raw) => warn!("Unrecognised Socket.IO frame: {raw}"),
            other => trace!(?other, "Ignoring packet"),
        }
    }
}

/// Next text frame as a [`Packet`], skipping WebSocket control and binary frames.
async fn next_packet(socket: &mut Socket) -> Result<Packet> {
    while let Some(message) = socket.next().await {
        match message {
            Ok(Message::Text(text)) => return Ok(parse_packet(text.as_str())),
            Ok(Message::Close(_)) => return Err(EmgError::Link("closed by server".into())),
            Ok(_) => {}
            Err(e) => return Err(EmgError::Link(format!("read: {e}"))),
        }
    }
    Err(EmgError::Link("stream ended".into()))
}

async fn send_text(socket: &mut Socket, text: String) -> Result<()> {
    socket
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| EmgError::Link(format!("write: {e}")))
}
