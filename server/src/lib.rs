//! # Air Hockey Relay Server
//!
//! This library pairs two game clients under a short share code and forwards
//! their state updates to each other. It runs no game simulation of its own:
//! each client simulates the table locally and the relay only moves frames
//! between the two peers of a session.
//!
//! ## Core Responsibilities
//!
//! ### Session Pairing
//! A client sends `create` and receives a five character code. A second
//! client sends `join` with that code, after which both receive `start`.
//! Sessions hold at most two connections.
//!
//! ### Relaying
//! `move` and `score` frames are forwarded exactly as received to the other
//! member of the sender's session. Payloads are not validated; frames from a
//! connection without a peer are dropped.
//!
//! ### Disconnect Handling
//! When either member's socket closes, the surviving member gets a single
//! `Peer disconnected` error and the whole session is removed.
//!
//! ## Architecture Design
//!
//! ### Single Dispatcher
//! Each WebSocket runs a reader task and a writer task. Readers push
//! [`relay::RelayEvent`]s into one channel; a single dispatcher applies them
//! to the [`registry::SessionRegistry`] in arrival order. The registry is
//! owned by that dispatcher, so it needs no locking even on the
//! multi-threaded runtime.
//!
//! ### Transport
//! WebSocket text frames carrying JSON objects with a `t` type field. The
//! same port serves a plain HTTP `GET /` health response.
//!
//! ## Module Organization
//!
//! ### Session Module (`session`)
//! Share codes and the two-seat session record.
//!
//! ### Registry Module (`registry`)
//! Connections, sessions, and the create/join/leave transitions between them.
//!
//! ### Relay Module (`relay`)
//! Frame classification and the event handler driving the registry.
//!
//! ### Network Module (`network`)
//! Listener, HTTP routes, socket tasks and the dispatcher loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::new("0.0.0.0:8080").await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod network;
pub mod registry;
pub mod relay;
pub mod session;
