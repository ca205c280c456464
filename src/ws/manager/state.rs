use crate::ws::transport::TransportEvents;

/// Observable connection state
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// no transport, a connection attempt is scheduled
    Disconnected,
    /// transport created, waiting for it to open
    Connecting,
    /// subscribed and exchanging keepalives
    Open,
}

/// A transport instance together with its event listener.
#[derive(Debug)]
pub(crate) struct Link<T> {
    pub transport: T,
    pub events: TransportEvents,
    pub attempt: u64,
}

#[derive(Debug)]
pub(crate) enum State<T> {
    Disconnected,
    Connecting(Link<T>),
    Open(Link<T>),
}

impl<T> State<T> {
    pub fn connection_state(&self) -> ConnectionState {
        match self {
            Self::Disconnected => ConnectionState::Disconnected,
            Self::Connecting(_) => ConnectionState::Connecting,
            Self::Open(_) => ConnectionState::Open,
        }
    }

    pub fn link_mut(&mut self) -> Option<&mut Link<T>> {
        match self {
            Self::Disconnected => None,
            Self::Connecting(link) | Self::Open(link) => Some(link),
        }
    }

    pub fn open_link_mut(&mut self) -> Option<&mut Link<T>> {
        match self {
            Self::Open(link) => Some(link),
            _ => None,
        }
    }

    /// Move to disconnected, returning the link that was current.
    pub fn take_link(&mut self) -> Option<Link<T>> {
        match std::mem::replace(self, Self::Disconnected) {
            Self::Disconnected => None,
            Self::Connecting(link) | Self::Open(link) => Some(link),
        }
    }

    /// Promote a connecting link to open.
    pub fn into_open(self) -> Self {
        match self {
            Self::Connecting(link) => Self::Open(link),
            other => other,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio::sync::mpsc;

    fn link() -> Link<()> {
        let (_, events) = mpsc::unbounded_channel();
        Link {
            transport: (),
            events,
            attempt: 1,
        }
    }

    #[test]
    fn test_state_transitions() {
        let mut state = State::Connecting(link());
        assert_eq!(state.connection_state(), ConnectionState::Connecting);
        assert!(state.link_mut().is_some());
        assert!(state.open_link_mut().is_none());

        state = state.into_open();
        assert_eq!(state.connection_state(), ConnectionState::Open);
        assert!(state.open_link_mut().is_some());

        let link = state.take_link().unwrap();
        assert_eq!(link.attempt, 1);
        assert_eq!(state.connection_state(), ConnectionState::Disconnected);
        assert!(state.take_link().is_none());
    }

    #[test]
    fn test_into_open_keeps_other_states() {
        let state = State::<()>::Disconnected.into_open();
        assert_eq!(state.connection_state(), ConnectionState::Disconnected);
    }
}
