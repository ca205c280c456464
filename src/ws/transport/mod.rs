//! Transport capability consumed by the connection manager.
//!
//! A transport is created by a [`Connector`] and reports its lifecycle through a
//! per-instance event channel. Dropping the receiving side of that channel detaches
//! every listener of the instance, so nothing it reports afterwards can reach the manager.

pub mod websocket;

use std::fmt::Debug;

use bytes::Bytes;
use snafu::prelude::*;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;

use crate::config::Endpoint;

/// Close code used when a connection is lost without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Close code used when the peer closed without giving a status.
pub const CLOSE_NO_STATUS: u16 = 1005;

/// Error reported by a transport
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), module(error), context(suffix(false)))]
pub enum TransportError {
    /// Establish connection failed
    #[snafu(display("connect {url} failed: {source}"))]
    Connect {
        /// endpoint url
        url: String,
        /// source error
        source: tungstenite::Error,
    },

    /// underlying websocket stream broken
    #[snafu(display("underlying websocket stream broken: {source}"))]
    Websocket {
        /// source error
        source: tungstenite::Error,
    },

    /// transport is not usable anymore
    #[snafu(display("transport already closed"))]
    Closed,
}

/// Lifecycle and data notification of one transport instance
#[derive(Debug)]
pub enum TransportEvent {
    /// connection established
    Open,
    /// inbound frame
    Message(Bytes),
    /// pong frame received
    Pong,
    /// connection closed
    Close {
        /// close code
        code: u16,
        /// close reason
        reason: String,
    },
    /// transport failed
    Error(TransportError),
}

/// Receiving side of a transport's event channel.
///
/// The channel is unbounded. While the manager waits on a stalled consumer, inbound
/// frames queue here without limit; none are dropped and they are handled in order
/// once the consumer reads again.
pub type TransportEvents = mpsc::UnboundedReceiver<TransportEvent>;

/// Handle of one transport instance.
///
/// All methods must return immediately; actual network work happens in the background.
pub trait Transport: Debug + Send + 'static {
    /// Queue a text frame
    fn send(&mut self, text: &str) -> Result<(), TransportError>;
    /// Queue a ping frame
    fn ping(&mut self) -> Result<(), TransportError>;
    /// Start closing the connection
    fn close(&mut self);
}

/// Factory of transport instances.
pub trait Connector: Send + 'static {
    /// Transport handle type
    type Transport: Transport;

    /// Start connecting to `endpoint`.
    ///
    /// The returned channel reports [`TransportEvent::Open`] once usable, or
    /// [`TransportEvent::Error`] if the attempt failed.
    fn connect(&mut self, endpoint: &Endpoint) -> (Self::Transport, TransportEvents);
}
