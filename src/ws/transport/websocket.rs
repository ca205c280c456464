use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use snafu::prelude::*;
use tokio::sync::mpsc;
use tokio_tungstenite as websocket;
use websocket::tungstenite::Message;

use super::{
    error, Connector, Transport, TransportError, TransportEvent, TransportEvents, CLOSE_ABNORMAL,
    CLOSE_NO_STATUS,
};
use crate::config::Endpoint;

type WebsocketClient =
    websocket::WebSocketStream<websocket::MaybeTlsStream<tokio::net::TcpStream>>;

#[derive(Debug)]
enum Command {
    Send(String),
    Ping,
    Close,
}

/// Connector that opens websocket connections with `tokio-tungstenite`.
///
/// Every connection is driven by its own background task, so it must be used inside a
/// tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebsocketConnector;

impl Connector for WebsocketConnector {
    type Transport = WebsocketTransport;

    fn connect(&mut self, endpoint: &Endpoint) -> (WebsocketTransport, TransportEvents) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        tokio::spawn(background(endpoint.to_string(), command_rx, event_tx));

        (WebsocketTransport { command_tx }, event_rx)
    }
}

/// Handle of a websocket connection created by [`WebsocketConnector`].
///
/// Dropping the handle closes the connection.
#[derive(Debug)]
pub struct WebsocketTransport {
    command_tx: mpsc::UnboundedSender<Command>,
}

impl WebsocketTransport {
    fn command(&self, command: Command) -> Result<(), TransportError> {
        self.command_tx
            .send(command)
            .map_err(|_| error::Closed.build())
    }
}

impl Transport for WebsocketTransport {
    fn send(&mut self, text: &str) -> Result<(), TransportError> {
        self.command(Command::Send(text.to_string()))
    }

    fn ping(&mut self) -> Result<(), TransportError> {
        self.command(Command::Ping)
    }

    fn close(&mut self) {
        if self.command(Command::Close).is_err() {
            log::trace!("Websocket already stopped when close");
        }
    }
}

fn frame_to_event(frame: Message) -> Option<TransportEvent> {
    match frame {
        Message::Text(text) => Some(TransportEvent::Message(Bytes::from(text))),
        Message::Binary(data) => Some(TransportEvent::Message(Bytes::from(data))),
        Message::Pong(_) => Some(TransportEvent::Pong),
        Message::Close(frame) => {
            let (code, reason) = frame
                .map(|f| (u16::from(f.code), f.reason.into_owned()))
                .unwrap_or_else(|| (CLOSE_NO_STATUS, String::new()));
            Some(TransportEvent::Close { code, reason })
        }
        // ping is answered by tungstenite itself
        Message::Ping(_) | Message::Frame(_) => None,
    }
}

async fn background(
    url: String,
    mut command_rx: mpsc::UnboundedReceiver<Command>,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
) {
    log::debug!("Connecting websocket endpoint: {}", url);

    // the handle is not usable before open, any command aborts the handshake
    let connected = tokio::select! {
        result = websocket::connect_async(&url) => result,
        _ = command_rx.recv() => {
            log::debug!("Connect to {} aborted", url);
            return;
        }
    };

    let mut ws: WebsocketClient = match connected.with_context(|_| error::Connect { url: &url }) {
        Ok((ws, _)) => ws,
        Err(err) => {
            log::debug!("Connect websocket endpoint failed: {}", err);
            let _ = event_tx.send(TransportEvent::Error(err));
            return;
        }
    };

    if event_tx.send(TransportEvent::Open).is_err() {
        log::debug!("Listener detached before open, drop connection");
        let _ = ws.close(None).await;
        return;
    }

    loop {
        tokio::select! {
            frame = ws.next() => {
                let (event, stop) = match frame {
                    Some(Ok(frame)) => match frame_to_event(frame) {
                        Some(event @ TransportEvent::Close { .. }) => (event, true),
                        Some(event) => (event, false),
                        None => continue,
                    },
                    Some(Err(source)) => {
                        log::debug!("Websocket stream broken: {}", source);
                        (TransportEvent::Error(TransportError::Websocket { source }), true)
                    }
                    None => (
                        TransportEvent::Close {
                            code: CLOSE_ABNORMAL,
                            reason: "stream ended".to_string(),
                        },
                        true,
                    ),
                };

                if event_tx.send(event).is_err() {
                    log::debug!("Listener detached, stop websocket");
                    break;
                }

                if stop {
                    log::trace!("Websocket finished");
                    return;
                }
            }

            command = command_rx.recv() => {
                let result = match command {
                    Some(Command::Send(text)) => ws.send(Message::Text(text)).await,
                    Some(Command::Ping) => ws.send(Message::Ping(Vec::new())).await,
                    Some(Command::Close) => {
                        log::debug!("Closing websocket");
                        // keep reading until peer acknowledges
                        ws.close(None).await
                    }
                    None => {
                        log::debug!("Transport handle dropped, stop websocket");
                        break;
                    }
                };

                if let Err(source) = result {
                    log::debug!("Websocket write failed: {}", source);
                    let _ = event_tx.send(TransportEvent::Error(TransportError::Websocket { source }));
                    break;
                }
            }
        }
    }

    let _ = ws.close(None).await;
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio::net::{TcpListener, TcpStream};
    use websocket::tungstenite::protocol::{frame::coding::CloseCode, CloseFrame};

    async fn listen() -> (TcpListener, Endpoint) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("ws://{}/inv", listener.local_addr().unwrap())
            .parse()
            .unwrap();
        (listener, endpoint)
    }

    async fn accept(listener: &TcpListener) -> websocket::WebSocketStream<TcpStream> {
        let (stream, _) = listener.accept().await.unwrap();
        websocket::accept_async(stream).await.unwrap()
    }

    #[test]
    fn test_text_and_binary_frame_become_message() {
        let event = frame_to_event(Message::Text(r#"{"op":"status"}"#.to_string())).unwrap();
        assert!(matches!(event, TransportEvent::Message(data) if data == r#"{"op":"status"}"#));

        let event = frame_to_event(Message::Binary(vec![1, 2, 3])).unwrap();
        assert!(matches!(event, TransportEvent::Message(data) if data[..] == [1, 2, 3]));
    }

    #[test]
    fn test_close_frame_keeps_code_and_reason() {
        let frame = CloseFrame {
            code: CloseCode::Away,
            reason: "bye".into(),
        };

        let event = frame_to_event(Message::Close(Some(frame))).unwrap();

        if let TransportEvent::Close { code, reason } = event {
            assert_eq!(code, 1001);
            assert_eq!(reason, "bye");
        } else {
            panic!("converted event is not close")
        }
    }

    #[test]
    fn test_close_without_frame_has_no_status() {
        let event = frame_to_event(Message::Close(None)).unwrap();
        assert!(matches!(event, TransportEvent::Close { code: CLOSE_NO_STATUS, .. }));
    }

    #[test]
    fn test_ping_is_not_reported() {
        assert!(frame_to_event(Message::Ping(vec![])).is_none());
        assert!(matches!(
            frame_to_event(Message::Pong(vec![])),
            Some(TransportEvent::Pong)
        ));
    }

    #[test]
    fn test_dropped_background_makes_handle_unusable() {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        drop(command_rx);

        let mut transport = WebsocketTransport { command_tx };

        assert!(matches!(transport.ping(), Err(TransportError::Closed)));
        assert!(matches!(transport.send("x"), Err(TransportError::Closed)));
        transport.close();
    }

    #[tokio::test]
    async fn test_websocket_exchange_with_peer() {
        let (listener, endpoint) = listen().await;
        let (mut transport, mut events) = WebsocketConnector.connect(&endpoint);
        let mut peer = accept(&listener).await;

        assert!(matches!(events.recv().await, Some(TransportEvent::Open)));

        transport.send(r#"{"op":"blocks_sub"}"#).unwrap();
        assert_eq!(
            peer.next().await.unwrap().unwrap(),
            Message::Text(r#"{"op":"blocks_sub"}"#.to_string())
        );

        transport.ping().unwrap();
        assert!(matches!(
            peer.next().await.unwrap().unwrap(),
            Message::Ping(_)
        ));

        // writing also flushes the pong queued for the ping
        peer.send(Message::Text(r#"{"op":"block","x":{"height":100}}"#.to_string()))
            .await
            .unwrap();

        let mut pong = false;
        let frame = loop {
            match events.recv().await {
                Some(TransportEvent::Pong) => pong = true,
                Some(TransportEvent::Message(frame)) => break frame,
                other => panic!("unexpected event {:?}", other),
            }
        };
        assert_eq!(frame, r#"{"op":"block","x":{"height":100}}"#);

        peer.close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "bye".into(),
        }))
        .await
        .unwrap();

        loop {
            match events.recv().await {
                Some(TransportEvent::Pong) => pong = true,
                Some(TransportEvent::Close { code, reason }) => {
                    assert_eq!(code, 1000);
                    assert_eq!(reason, "bye");
                    break;
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert!(pong);

        // background task finished after the close
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_close_command_reaches_peer() {
        let (listener, endpoint) = listen().await;
        let (mut transport, mut events) = WebsocketConnector.connect(&endpoint);
        let mut peer = accept(&listener).await;

        assert!(matches!(events.recv().await, Some(TransportEvent::Open)));

        transport.close();
        assert!(matches!(
            peer.next().await.unwrap().unwrap(),
            Message::Close(_)
        ));
    }

    #[tokio::test]
    async fn test_connect_refused_reports_error() {
        let (listener, endpoint) = listen().await;
        drop(listener);

        let (_transport, mut events) = WebsocketConnector.connect(&endpoint);

        assert!(matches!(
            events.recv().await,
            Some(TransportEvent::Error(TransportError::Connect { .. }))
        ));
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_close_aborts_unanswered_handshake() {
        let (listener, endpoint) = listen().await;
        let (mut transport, mut events) = WebsocketConnector.connect(&endpoint);

        // peer accepts tcp but never answers the handshake
        let (_stream, _) = listener.accept().await.unwrap();

        transport.close();

        assert!(events.recv().await.is_none());
    }
}
