use futures_util::future;
use tokio::sync::{mpsc, watch};

use super::{
    state::{Link, State},
    timer::Timer,
    ConnectionState,
};
use crate::{
    config::Config,
    diagnostic::{error, Diagnostic, DiagnosticSink},
    dispatch::Action,
    ws::{
        message::Decoder,
        transport::{Connector, Transport, TransportEvent, TransportEvents, CLOSE_ABNORMAL},
    },
    Event,
};

#[derive(Debug)]
enum Input {
    Transport(TransportEvent),
    TransportGone,
    ReconnectDue,
    ConnectTimedOut,
    PingDue,
    PingTimedOut,
    ConsumerGone,
}

/// Connection state machine, runs in its own task.
///
/// Every input is handled to completion before the next one is taken, handlers
/// return `false` once the consumer is gone.
///
/// While connecting, only a close is reported as `Disconnect`. An error or a connect
/// timeout detaches the attempt silently, so a close that follows it is never seen.
/// Close then error therefore yields one `Disconnect` and error then close yields none.
/// Once open, both orders yield exactly one.
pub(crate) struct Lifecycle<C: Connector, D, S> {
    config: Config,
    connector: C,
    decoder: D,
    diagnostics: S,
    state: State<C::Transport>,
    reconnect: Timer,
    connect_timeout: Timer,
    ping_interval: Timer,
    ping_timeout: Timer,
    event_tx: mpsc::Sender<Event>,
    state_tx: watch::Sender<ConnectionState>,
    attempts: u64,
}

async fn recv_transport<T>(state: &mut State<T>) -> Option<TransportEvent> {
    match state.link_mut() {
        Some(link) => link.events.recv().await,
        None => future::pending().await,
    }
}

impl<C, D, S> Lifecycle<C, D, S>
where
    C: Connector,
    D: Decoder,
    S: DiagnosticSink,
{
    pub fn new(
        config: Config,
        connector: C,
        decoder: D,
        diagnostics: S,
        event_tx: mpsc::Sender<Event>,
        state_tx: watch::Sender<ConnectionState>,
    ) -> Self {
        Self {
            config,
            connector,
            decoder,
            diagnostics,
            state: State::Disconnected,
            reconnect: Timer::new("reconnect"),
            connect_timeout: Timer::new("connect timeout"),
            ping_interval: Timer::new("ping interval"),
            ping_timeout: Timer::new("ping timeout"),
            event_tx,
            state_tx,
            attempts: 0,
        }
    }

    pub async fn run(mut self) {
        log::debug!("Connection manager start");

        self.connect();

        loop {
            let input = self.next_input().await;
            log::trace!("Handle input {:?}", input);
            if !self.handle(input).await {
                break;
            }
        }

        self.shutdown();
    }

    async fn next_input(&mut self) -> Input {
        tokio::select! {
            biased;

            _ = self.event_tx.closed() => Input::ConsumerGone,

            event = recv_transport(&mut self.state) => match event {
                Some(event) => Input::Transport(event),
                None => Input::TransportGone,
            },

            _ = self.ping_timeout.fired() => Input::PingTimedOut,

            _ = self.connect_timeout.fired() => Input::ConnectTimedOut,

            _ = self.ping_interval.fired() => Input::PingDue,

            _ = self.reconnect.fired() => Input::ReconnectDue,
        }
    }

    async fn handle(&mut self, input: Input) -> bool {
        match input {
            Input::Transport(event) => self.on_transport_event(event).await,
            Input::TransportGone => {
                log::debug!("Transport stopped without close notification");
                self.on_close(CLOSE_ABNORMAL, "transport stopped").await
            }
            Input::ReconnectDue => {
                self.on_reconnect_due();
                true
            }
            Input::ConnectTimedOut => {
                self.on_connect_timeout();
                true
            }
            Input::PingDue => self.on_ping_due().await,
            Input::PingTimedOut => self.on_ping_timeout().await,
            Input::ConsumerGone => {
                log::debug!("Event stream dropped, stop");
                false
            }
        }
    }

    fn set_state(&mut self, state: State<C::Transport>) {
        self.state = state;
        self.state_tx.send_replace(self.state.connection_state());
    }

    fn connect(&mut self) {
        self.attempts += 1;

        log::info!(
            "Connecting {} (attempt {})",
            self.config.endpoint,
            self.attempts
        );

        let (transport, events): (C::Transport, TransportEvents) =
            self.connector.connect(&self.config.endpoint);

        log::debug!("Move to connecting state");

        self.set_state(State::Connecting(Link {
            transport,
            events,
            attempt: self.attempts,
        }));

        self.connect_timeout.arm(self.config.connect_timeout);
    }

    async fn on_transport_event(&mut self, event: TransportEvent) -> bool {
        match (self.state.connection_state(), event) {
            (ConnectionState::Connecting, TransportEvent::Open) => self.on_open().await,

            (ConnectionState::Connecting, TransportEvent::Error(err)) => {
                log::warn!("Connection error: {}", err);
                self.schedule_reconnect();
                true
            }

            (ConnectionState::Open, TransportEvent::Error(err)) => {
                log::warn!("Connection error: {}", err);
                self.on_close(CLOSE_ABNORMAL, &err.to_string()).await
            }

            (_, TransportEvent::Close { code, reason }) => self.on_close(code, &reason).await,

            (ConnectionState::Open, TransportEvent::Message(frame)) => {
                self.on_message(frame).await
            }

            (ConnectionState::Open, TransportEvent::Pong) => {
                log::trace!("Pong received");
                self.reset_ping_timer();
                true
            }

            (state, event) => {
                log::debug!("Ignore {:?} in {:?} state", event, state);
                true
            }
        }
    }

    async fn on_open(&mut self) -> bool {
        log::info!("Connection established");

        self.connect_timeout.cancel();

        let link = match self.state.link_mut() {
            Some(link) => link,
            None => return true,
        };

        let failed = self.config.subscriptions.iter().find_map(|request| {
            log::debug!("Send subscription: {}", request);
            link.transport.send(request).err()
        });

        if let Some(err) = failed {
            log::warn!("Send subscription failed: {}", err);
            self.schedule_reconnect();
            return true;
        }

        log::debug!("Move to open state");

        let state = std::mem::replace(&mut self.state, State::Disconnected);
        self.set_state(state.into_open());

        self.reset_ping_timer();

        self.emit(Event::Connect).await
    }

    async fn on_message(&mut self, frame: bytes::Bytes) -> bool {
        let mut alive = true;

        match self.decoder.decode(&frame) {
            Ok(operation) => {
                log::trace!("Op received: '{}'", operation.op);

                match self.config.dispatch.action(&operation.op) {
                    Some(Action::Log) => {
                        log::info!("Operation {}: {}", operation.op, operation.data);
                    }
                    Some(Action::Emit) => {
                        alive = self.emit(Event::Message(operation)).await;
                    }
                    None => {
                        self.diagnostics
                            .report(error::UnknownOperation { op: operation.op }.build());
                    }
                }
            }
            Err(err) => {
                log::trace!(
                    "Undecodable frame: {}",
                    std::str::from_utf8(&frame).unwrap_or("<not-utf8-binary>")
                );
                self.diagnostics.report(Diagnostic::Decode { source: err });
            }
        }

        self.reset_ping_timer();

        alive
    }

    async fn on_ping_due(&mut self) -> bool {
        let ping_timeout = self.config.ping_timeout;

        let link = match self.state.open_link_mut() {
            Some(link) => link,
            None => return true,
        };

        log::trace!("Ping interval, send ping, timeout {:?}", ping_timeout);

        match link.transport.ping() {
            Ok(()) => {
                self.ping_timeout.arm(ping_timeout);
                true
            }
            Err(err) => {
                log::warn!("Send ping failed: {}", err);
                self.on_close(CLOSE_ABNORMAL, &err.to_string()).await
            }
        }
    }

    async fn on_ping_timeout(&mut self) -> bool {
        let link = match self.state.open_link_mut() {
            Some(link) => link,
            None => return true,
        };

        log::warn!("Ping timed out, close connection");
        link.transport.close();

        self.on_close(CLOSE_ABNORMAL, "ping timeout").await
    }

    fn on_connect_timeout(&mut self) {
        if self.state.connection_state() != ConnectionState::Connecting {
            log::debug!("Connect timer fired when not connecting, ignore");
            return;
        }

        if let Some(link) = self.state.link_mut() {
            log::warn!(
                "Connect attempt {} not open after {:?}, abort",
                link.attempt,
                self.config.connect_timeout
            );
            link.transport.close();
        }

        self.schedule_reconnect();
    }

    fn on_reconnect_due(&mut self) {
        if self.state.connection_state() != ConnectionState::Disconnected {
            log::debug!("Reconnect timer fired when not disconnected, ignore");
            return;
        }

        self.connect();
    }

    async fn on_close(&mut self, code: u16, reason: &str) -> bool {
        log::info!("Connection closed with code {}: {}", code, reason);

        self.detach();

        let alive = self.emit(Event::Disconnect).await;

        self.arm_reconnect();

        alive
    }

    /// Cancel connection timers and drop the current transport with its listener.
    fn detach(&mut self) {
        self.connect_timeout.cancel();
        self.ping_interval.cancel();
        self.ping_timeout.cancel();

        if let Some(link) = self.state.take_link() {
            log::debug!("Detach transport of attempt {}", link.attempt);
        }

        log::debug!("Move to disconnected state");
        self.state_tx.send_replace(ConnectionState::Disconnected);
    }

    fn arm_reconnect(&mut self) {
        if self.reconnect.is_armed() {
            log::debug!("Replace pending reconnect timer");
        }

        log::info!("Reconnecting in {:?}", self.config.reconnect_delay);
        self.reconnect.arm(self.config.reconnect_delay);
    }

    fn schedule_reconnect(&mut self) {
        self.detach();
        self.arm_reconnect();
    }

    fn reset_ping_timer(&mut self) {
        self.ping_timeout.cancel();
        self.ping_interval.arm(self.config.ping_interval);
    }

    async fn emit(&mut self, event: Event) -> bool {
        log::debug!("Emit {} event", event.type_name());

        if self.event_tx.send(event).await.is_ok() {
            true
        } else {
            log::debug!("Emit event failed, means receive side dropped, stop");
            false
        }
    }

    fn shutdown(&mut self) {
        self.reconnect.cancel();
        self.connect_timeout.cancel();
        self.ping_interval.cancel();
        self.ping_timeout.cancel();

        if let Some(mut link) = self.state.take_link() {
            log::debug!("Close transport of attempt {}", link.attempt);
            link.transport.close();
        }

        self.state_tx.send_replace(ConnectionState::Disconnected);

        log::debug!("Connection manager stopped");
    }
}
