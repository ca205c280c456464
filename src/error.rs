//! crate error types

use snafu::prelude::*;

use crate::config::ParseEndpointError;

/// crate result type
pub type Result<T> = std::result::Result<T, Error>;

/// crate error type
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), context(suffix(false)))]
pub enum Error {
    /// Received invalid endpoint url address
    #[snafu(display("invalid endpoint url {url}: {source}"))]
    InvalidEndpoint {
        /// received url
        url: String,
        /// source error
        source: ParseEndpointError,
    },

    /// Connection manager task ended unexpectedly
    #[snafu(display("connection manager stopped"))]
    ManagerStopped,
}
