//! Preset for the blockchain.info `inv` push feed.
//!
//! The feed accepts `{"op":"blocks_sub"}` to subscribe new blocks and
//! `{"op":"ping_block"}` to get the latest block, and pushes frames like
//! `{"op":"block","x":{"height":...,"time":...}}`.

use serde::{Deserialize, Serialize};

use crate::{
    config::{Config, Endpoint},
    dispatch::{Action, Dispatch},
    ws::Operation,
};

/// blockchain.info push feed address
pub const ENDPOINT: &str = "wss://ws.blockchain.info/inv";

/// subscribe new block notifications
pub const SUBSCRIBE_BLOCKS: &str = r#"{"op":"blocks_sub"}"#;

/// ask for the latest block
pub const PING_BLOCK: &str = r#"{"op":"ping_block"}"#;

/// informational status operation
pub const OP_STATUS: &str = "status";

/// new block operation
pub const OP_BLOCK: &str = "block";

/// Dispatch table of the feed: log status, emit blocks.
pub fn dispatch() -> Dispatch {
    Dispatch::new()
        .route(OP_STATUS, Action::Log)
        .route(OP_BLOCK, Action::Emit)
}

/// Config for the feed at `endpoint`
pub fn config(endpoint: Endpoint) -> Config {
    Config::new(endpoint)
        .with_subscription(SUBSCRIBE_BLOCKS)
        .with_subscription(PING_BLOCK)
        .with_dispatch(dispatch())
}

/// A new block notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// block height
    pub height: u64,
    /// block timestamp, in seconds
    pub time: u64,
    /// block hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// transaction count
    #[serde(rename = "nTx", default, skip_serializing_if = "Option::is_none")]
    pub tx_count: Option<u64>,
    /// block size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl TryFrom<&Operation> for Block {
    type Error = serde_json::Error;

    fn try_from(op: &Operation) -> Result<Self, Self::Error> {
        Self::deserialize(&op.data)
    }
}
