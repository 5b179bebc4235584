//! WebSocket link to the relay.
//!
//! The socket lives on a background thread with its own tokio runtime so the
//! render loop never blocks on I/O. The two sides talk through unbounded
//! channels: frames to send go in, decoded server messages come out and are
//! drained once per frame.

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientMessage, ServerMessage};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkEvent {
    Connected,
    Message(ServerMessage),
    /// The socket closed or never opened; carries the failure, if any.
    Disconnected(Option<String>),
}

pub struct NetworkClient {
    outgoing: mpsc::UnboundedSender<String>,
    incoming: mpsc::UnboundedReceiver<NetworkEvent>,
}

impl NetworkClient {
    /// Starts connecting to `url` in the background. Frames sent before the
    /// socket opens are queued and flushed once it does.
    pub fn connect(url: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let url = url.to_string();

        std::thread::Builder::new()
            .name("relay-link".to_string())
            .spawn(move || runtime.block_on(run_connection(url, out_rx, in_tx)))?;

        Ok(NetworkClient {
            outgoing: out_tx,
            incoming: in_rx,
        })
    }

    /// Reuses the client in `slot` while its link is alive, otherwise opens a
    /// new one.
    pub fn ensure<'a>(slot: &'a mut Option<NetworkClient>, url: &str) -> Option<&'a NetworkClient> {
        if slot.as_ref().map_or(true, NetworkClient::is_closed) {
            match NetworkClient::connect(url) {
                Ok(client) => *slot = Some(client),
                Err(e) => {
                    error!("Failed to start connection to {}: {}", url, e);
                    return None;
                }
            }
        }
        slot.as_ref()
    }

    /// Queues a message. Returns false once the link has shut down.
    pub fn send(&self, msg: &ClientMessage) -> bool {
        match msg.encode() {
            Ok(text) => self.outgoing.send(text).is_ok(),
            Err(e) => {
                error!("Failed to encode {:?}: {}", msg, e);
                false
            }
        }
    }

    /// Drains everything received since the last call.
    pub fn poll(&mut self) -> Vec<NetworkEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.incoming.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn is_closed(&self) -> bool {
        self.outgoing.is_closed()
    }
}

async fn run_connection(
    url: String,
    mut out_rx: mpsc::UnboundedReceiver<String>,
    in_tx: mpsc::UnboundedSender<NetworkEvent>,
) {
    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _)) => stream,
        Err(e) => {
            warn!("Could not connect to {}: {}", url, e);
            let _ = in_tx.send(NetworkEvent::Disconnected(Some(e.to_string())));
            return;
        }
    };

    info!("Connected to {}", url);
    let _ = in_tx.send(NetworkEvent::Connected);

    let (mut write, mut read) = stream.split();
    let mut failure = None;

    loop {
        tokio::select! {
            outgoing = out_rx.recv() => match outgoing {
                Some(text) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        failure = Some(e.to_string());
                        break;
                    }
                }
                None => {
                    let _ = write.close().await;
                    break;
                }
            },

            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => match ServerMessage::decode(&text) {
                    Ok(msg) => {
                        if in_tx.send(NetworkEvent::Message(msg)).is_err() {
                            break;
                        }
                    }
                    Err(e) => debug!("Ignoring unreadable frame: {}", e),
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    failure = Some(e.to_string());
                    break;
                }
            },
        }
    }

    info!("Disconnected from {}", url);
    let _ = in_tx.send(NetworkEvent::Disconnected(failure));
}
