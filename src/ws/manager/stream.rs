use std::task::Poll;

use futures_util::Stream;
use tokio::sync::{mpsc, watch};

use super::ConnectionState;
use crate::Event;

/// Stream of events emitted by a running connection manager
///
/// Dropping it stops the manager.
#[derive(Debug)]
pub struct EventStream {
    pub(crate) rx: mpsc::Receiver<Event>,
    pub(crate) state: watch::Receiver<ConnectionState>,
}

impl EventStream {
    /// current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// watcher notified on every connection state change
    pub fn state_watcher(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
