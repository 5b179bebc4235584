//! # Air Hockey Client Library
//!
//! This library provides the client side of the two-player air hockey game:
//! input capture, local table simulation, the relay connection and rendering.
//!
//! ## Architecture Overview
//!
//! Each client simulates the whole table on its own. There is no
//! authoritative server state; the relay only forwards frames between the two
//! players of a session.
//!
//! ### Local Simulation
//! The local mallet chases the pointer with exponential smoothing, the puck
//! moves with friction, and mallet strikes and rail bounces are resolved with
//! restitution coefficients. A fixed 60 Hz tick drives all of it.
//!
//! ### Remote Blending
//! Each tick a client sends its mallet and its copy of the puck. The receiver
//! takes the opponent mallet as is and blends its puck 30% toward the
//! received puck, which smooths jitter but means whichever update arrived
//! last steers the puck.
//!
//! ### Mirrored Frames
//! Both players see themselves on the left. Outgoing coordinates are mirrored
//! horizontally so the receiver can apply them without transformation.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! Match state, the simulation tick, scoring and server message handling.
//!
//! ### Input Module (`input`)
//! Pointer sampling and the share-code entry used to create or join matches.
//!
//! ### Network Module (`network`)
//! The WebSocket link to the relay, running on a background thread.
//!
//! ### Rendering Module (`rendering`)
//! Table, mallets, puck and the status bar.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::game::MatchState;
//! use client::network::{NetworkClient, NetworkEvent};
//! use shared::ClientMessage;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut game = MatchState::new();
//! let mut network = NetworkClient::connect("ws://127.0.0.1:8080/")?;
//! network.send(&ClientMessage::Create);
//!
//! loop {
//!     for event in network.poll() {
//!         match event {
//!             NetworkEvent::Connected => game.on_connected(),
//!             NetworkEvent::Message(msg) => game.handle_server_message(msg),
//!             NetworkEvent::Disconnected(_) => game.on_disconnected(),
//!         }
//!     }
//!
//!     if let Some(score) = game.step() {
//!         network.send(&score);
//!     }
//!     if game.should_broadcast() {
//!         network.send(&ClientMessage::Move(game.outgoing_move()));
//!     }
//! #   break;
//! }
//! # Ok(())
//! # }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
