//! Connection manager configuration.

use std::{fmt::Display, str::FromStr, time::Duration};

use snafu::prelude::*;
use url::Url;

use crate::dispatch::Dispatch;

/// Default delay between a disconnection and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(60);
/// Default time a connection attempt may take to open.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default idle time before a ping is sent.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(45);
/// Default time to wait for liveness after a ping.
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Parse string as endpoint error
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), module(error), context(suffix(false)))]
pub enum ParseEndpointError {
    #[snafu(display("{s} is an invalid url: {source}"))]
    /// the str is not a valid url
    InvalidURL {
        /// string be parsed
        s: String,
        /// source error
        source: url::ParseError,
    },

    /// the parsed url schema is not websocket
    #[snafu(display("the url {s} has invalid schema {schema}, only ws or wss is ok"))]
    InvalidSchema {
        /// the url
        s: String,
        /// invalid schema
        schema: String,
    },
}

/// Remote push endpoint, a `ws` or `wss` url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    /// endpoint url
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl FromStr for Endpoint {
    type Err = ParseEndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s).context(error::InvalidURL { s })?;

        ensure!(
            matches!(url.scheme(), "ws" | "wss"),
            error::InvalidSchema {
                s,
                schema: url.scheme(),
            }
        );

        Ok(Self { url })
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.url, f)
    }
}

/// Connection manager configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// remote endpoint
    pub endpoint: Endpoint,
    /// delay before reconnect after connection lost
    pub reconnect_delay: Duration,
    /// max wait time for a connection attempt to open
    pub connect_timeout: Duration,
    /// idle time before sending a ping
    pub ping_interval: Duration,
    /// max wait time for liveness after a ping
    pub ping_timeout: Duration,
    /// requests sent right after connection opened
    pub subscriptions: Vec<String>,
    /// what to do with each decoded operation
    pub dispatch: Dispatch,
}

impl Config {
    /// Create config with default timings, no subscription and an empty dispatch table
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            ping_interval: DEFAULT_PING_INTERVAL,
            ping_timeout: DEFAULT_PING_TIMEOUT,
            subscriptions: Vec::new(),
            dispatch: Dispatch::default(),
        }
    }

    /// set reconnect delay
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// set connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// set ping interval
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// set ping timeout
    pub fn with_ping_timeout(mut self, timeout: Duration) -> Self {
        self.ping_timeout = timeout;
        self
    }

    /// append a request sent on every open
    pub fn with_subscription<S: Into<String>>(mut self, request: S) -> Self {
        self.subscriptions.push(request.into());
        self
    }

    /// replace dispatch table
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_endpoint() {
        let endpoint: Endpoint = "wss://ws.blockchain.info/inv".parse().unwrap();
        assert_eq!(endpoint.url().host_str(), Some("ws.blockchain.info"));
        assert_eq!(endpoint.to_string(), "wss://ws.blockchain.info/inv");
    }

    #[test]
    fn test_parse_endpoint_invalid() {
        assert!(matches!(
            "not a url".parse::<Endpoint>(),
            Err(ParseEndpointError::InvalidURL { .. })
        ));
        assert!(matches!(
            "https://ws.blockchain.info/inv".parse::<Endpoint>(),
            Err(ParseEndpointError::InvalidSchema { ref schema, .. }) if schema == "https"
        ));
        assert!(matches!(
            "ws://".parse::<Endpoint>(),
            Err(ParseEndpointError::InvalidURL { .. })
        ));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::new("ws://127.0.0.1:7777/inv".parse().unwrap());

        assert_eq!(config.reconnect_delay, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.ping_interval, Duration::from_secs(45));
        assert_eq!(config.ping_timeout, Duration::from_secs(5));
        assert!(config.subscriptions.is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = Config::new("ws://127.0.0.1:7777/inv".parse().unwrap())
            .with_reconnect_delay(Duration::from_secs(1))
            .with_connect_timeout(Duration::from_secs(4))
            .with_ping_interval(Duration::from_secs(2))
            .with_ping_timeout(Duration::from_secs(3))
            .with_subscription("a")
            .with_subscription("b");

        assert_eq!(config.reconnect_delay, Duration::from_secs(1));
        assert_eq!(config.connect_timeout, Duration::from_secs(4));
        assert_eq!(config.ping_interval, Duration::from_secs(2));
        assert_eq!(config.ping_timeout, Duration::from_secs(3));
        assert_eq!(config.subscriptions, ["a", "b"]);
    }
}
