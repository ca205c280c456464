//! Connection lifecycle manager.
//!
//! The manager connects, subscribes, keeps the connection alive with pings and
//! reconnects after every loss, forever, until its [`EventStream`] is dropped.
//!
//! ```text
//!                start / reconnect timer
//! Disconnected ------------------------> Connecting
//!      ^                                   |  open: subscribe, emit connect
//!      |  close / error / ping timeout     v
//!      +---------------------------------- Open <-- frame / pong rearm ping interval
//! ```

mod lifecycle;
mod state;
mod stream;
mod timer;


pub use state::ConnectionState;
pub use stream::EventStream;

use tokio::sync::{mpsc, watch};

use crate::{
    config::Config,
    diagnostic::{DiagnosticSink, LogSink},
    ws::{message::Decoder, transport::Connector},
};
use lifecycle::Lifecycle;

/// Capacity of the event channel between manager and consumer.
///
/// A full channel suspends the manager, timers included, until the consumer reads.
const EVENT_BUFFER: usize = 32;

/// Resilient connection to a push endpoint.
#[derive(Debug)]
pub struct ConnectionManager<C, D, S = LogSink> {
    config: Config,
    connector: C,
    decoder: D,
    diagnostics: S,
}

impl<C, D> ConnectionManager<C, D, LogSink>
where
    C: Connector,
    D: Decoder,
{
    /// Create a manager reporting diagnostics to the log
    pub fn new(config: Config, connector: C, decoder: D) -> Self {
        Self {
            config,
            connector,
            decoder,
            diagnostics: LogSink,
        }
    }
}

impl<C, D, S> ConnectionManager<C, D, S>
where
    C: Connector,
    D: Decoder,
    S: DiagnosticSink,
{
    /// Replace the sink receiving decode and unknown operation reports
    pub fn with_diagnostics<N: DiagnosticSink>(self, sink: N) -> ConnectionManager<C, D, N> {
        ConnectionManager {
            config: self.config,
            connector: self.connector,
            decoder: self.decoder,
            diagnostics: sink,
        }
    }

    /// Start connecting in a background task, returning the event stream.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(self) -> EventStream {
        let (event_tx, rx) = mpsc::channel(EVENT_BUFFER);
        let (state_tx, state) = watch::channel(ConnectionState::Disconnected);

        let lifecycle = Lifecycle::new(
            self.config,
            self.connector,
            self.decoder,
            self.diagnostics,
            event_tx,
            state_tx,
        );

        tokio::spawn(lifecycle.run());

        EventStream { rx, state }
    }
}
