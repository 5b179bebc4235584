//! Server network layer: HTTP health route, WebSocket sockets and the
//! dispatcher loop

use crate::relay::{Relay, RelayEvent};
use crate::session::ConnectionId;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Body of the plain HTTP root response used by platform health checks.
pub const HEALTH_RESPONSE: &str = "Air Hockey Relay OK";

/// State shared by every socket task
struct AppState {
    events: mpsc::UnboundedSender<RelayEvent>,
    next_connection_id: AtomicU32,
}

/// Relay server bound to a TCP listener
pub struct Server {
    listener: TcpListener,
    relay: Relay,

    // Socket tasks -> dispatcher
    events_tx: mpsc::UnboundedSender<RelayEvent>,
    events_rx: mpsc::UnboundedReceiver<RelayEvent>,
}

impl Server {
    pub async fn new(addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_relay(addr, Relay::new()).await
    }

    /// Binds `addr` and dispatches into the given relay.
    pub async fn with_relay(addr: &str, relay: Relay) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            relay,
            events_tx,
            events_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves HTTP/WebSocket traffic and dispatches relay events until the
    /// listener fails.
    pub async fn run(self) -> std::io::Result<()> {
        let Server {
            listener,
            mut relay,
            events_tx,
            mut events_rx,
        } = self;

        let state = Arc::new(AppState {
            events: events_tx,
            next_connection_id: AtomicU32::new(1),
        });

        let app = Router::new()
            .route("/", get(root_handler))
            .fallback(upgrade_handler)
            .with_state(state);

        info!("Server started successfully");

        tokio::select! {
            result = axum::serve(listener, app).into_future() => {
                result?;
            }
            _ = dispatch(&mut relay, &mut events_rx) => {
                info!("Dispatcher stopped");
            }
        }

        Ok(())
    }
}

/// Applies relay events one at a time, in arrival order.
async fn dispatch(relay: &mut Relay, events_rx: &mut mpsc::UnboundedReceiver<RelayEvent>) {
    while let Some(event) = events_rx.recv().await {
        relay.handle_event(event);
    }
}

/// `/` answers health checks and also accepts WebSocket upgrades.
async fn root_handler(
    State(state): State<Arc<AppState>>,
    ws: Option<WebSocketUpgrade>,
) -> Response {
    match ws {
        Some(ws) => ws.on_upgrade(move |socket| handle_socket(socket, state)),
        None => HEALTH_RESPONSE.into_response(),
    }
}

/// Any other path accepts WebSocket upgrades and is otherwise not found.
async fn upgrade_handler(
    State(state): State<Arc<AppState>>,
    ws: Option<WebSocketUpgrade>,
) -> Response {
    match ws {
        Some(ws) => ws.on_upgrade(move |socket| handle_socket(socket, state)),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Pumps one socket: inbound frames become relay events, queued outbound
/// text is written back. Either side ending closes the connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let conn_id: ConnectionId = state.next_connection_id.fetch_add(1, Ordering::Relaxed);
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

    if state
        .events
        .send(RelayEvent::Connected {
            conn_id,
            sender: out_tx,
        })
        .is_err()
    {
        error!("Dispatcher is gone, dropping connection {}", conn_id);
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(text) = out_rx.recv().await {
            if let Err(e) = ws_sender.send(Message::Text(text)).await {
                debug!("Write to connection {} failed: {}", conn_id, e);
                break;
            }
        }
    });

    let events = state.events.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            let text = match msg {
                Message::Text(text) => text,
                Message::Binary(data) => match String::from_utf8(data) {
                    Ok(text) => text,
                    Err(_) => continue,
                },
                Message::Close(_) => break,
                _ => continue,
            };

            if events.send(RelayEvent::Text { conn_id, text }).is_err() {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    if state.events.send(RelayEvent::Closed { conn_id }).is_err() {
        error!("Dispatcher is gone, connection {} not cleaned up", conn_id);
    }
}
