//! Push endpoint client: transport, frame decoding and the connection manager.

pub mod manager;
pub mod message;
pub mod transport;

pub use manager::{ConnectionManager, ConnectionState, EventStream};
pub use message::{DecodeError, Decoder, JsonDecoder, Operation};
pub use transport::{
    websocket::{WebsocketConnector, WebsocketTransport},
    Connector, Transport, TransportError, TransportEvent, TransportEvents,
};
