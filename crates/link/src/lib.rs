pub mod backoff;
pub mod client;
pub mod connection;
pub mod endpoint;
pub mod packet;

pub use backoff::Backoff;
pub use client::{LinkHandle, SocketIoTransport, Transport};
pub use connection::{Connection, ConnectionState, Effect};
pub use endpoint::Endpoint;
pub use packet::{parse_packet, Handshake, Packet};
