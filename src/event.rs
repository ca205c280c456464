//! Events emitted to the consumer.

use enum_as_inner::EnumAsInner;

use crate::ws::Operation;

/// Event type
#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum Event {
    /// connection opened and subscribed
    Connect,
    /// connection lost, a reconnect is scheduled
    Disconnect,
    /// a data operation arrived
    Message(Operation),
}

impl Event {
    /// get type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Message(_) => "message",
        }
    }
}
