//! # Chainfeed
//!
//! A resilient push feed client. A [`ConnectionManager`] keeps one streaming
//! connection alive forever: it subscribes on open, pings while idle, treats a
//! missing pong as a dead peer, and reconnects after a fixed delay whenever the
//! connection is lost. Consumers only see [`Event::Connect`], [`Event::Disconnect`]
//! and [`Event::Message`].

#![deny(clippy::all)]
#![warn(missing_debug_implementations, missing_docs)]
#![forbid(unsafe_code)]

pub mod blockchain;
pub mod config;
pub mod diagnostic;
pub mod dispatch;
pub mod filter;
pub mod subscriber;
pub mod ws;

mod error;
mod event;

pub use config::{Config, Endpoint};
pub use error::{Error, Result};
pub use event::Event;
pub use ws::{ConnectionManager, ConnectionState, EventStream};

use std::sync::Arc;

use futures_util::StreamExt;
use snafu::prelude::*;

use filter::Filter;
use subscriber::Subscriber;
use ws::{JsonDecoder, WebsocketConnector};

/// blockchain.info block feed over websocket
#[derive(Debug)]
pub struct Feed {
    config: Config,
}

impl Feed {
    /// Create a blockchain.info feed reading from `endpoint`
    pub fn new<S: AsRef<str> + ?Sized>(endpoint: &S) -> Result<Self> {
        let url = endpoint.as_ref();
        let endpoint = url
            .parse()
            .with_context(|_| error::InvalidEndpoint { url })?;

        log::info!("Create feed for endpoint {}", url);

        Ok(Self::from_config(blockchain::config(endpoint)))
    }

    /// Create a feed with custom config
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Run, passing every event to `subscriber`
    pub async fn run<S>(self, subscriber: S) -> Result<()>
    where
        S: Subscriber + 'static,
    {
        self.run_with_filter(filter::all(), subscriber).await
    }

    /// Run, passing events accepted by `filter` to `subscriber`
    pub async fn run_with_filter<F, S>(self, filter: F, subscriber: S) -> Result<()>
    where
        F: Filter,
        S: Subscriber + 'static,
    {
        let subscriber = Arc::new(subscriber);

        log::info!("Start feed with subscriber {}", subscriber.name());

        let mut stream =
            ConnectionManager::new(self.config, WebsocketConnector, JsonDecoder::default())
                .start();

        while let Some(event) = stream.next().await {
            if !filter.filter_event(&event) {
                log::trace!("Filtered out {} event", event.type_name());
                continue;
            }

            subscriber.clone().on_event(Arc::new(event)).await;
        }

        log::warn!("Event stream ended");

        error::ManagerStopped.fail()
    }
}
