//! Types and physics shared between the relay server and the game client.

pub mod physics;
pub mod protocol;

pub use physics::{
    check_collision, clamp_mallet, handle_walls, lerp, resolve_collision, Goal, Mallet, Puck, Rgb,
};
pub use protocol::{
    ClientMessage, MoveUpdate, Scorer, ServerMessage, INVALID_OR_FULL_CODE, PEER_DISCONNECTED,
};

pub const TABLE_WIDTH: f32 = 800.0;
pub const TABLE_HEIGHT: f32 = 450.0;
pub const GOAL_HEIGHT: f32 = 80.0;

pub const MALLET_RADIUS: f32 = 24.0;
pub const PUCK_RADIUS: f32 = 14.0;
pub const MALLET_MASS: f32 = 2.5;
pub const PUCK_MASS: f32 = 1.0;

/// Per-tick velocity retention of the puck.
pub const FRICTION: f32 = 0.995;
/// Restitution against the table rails.
pub const WALL_RESTITUTION: f32 = 0.98;
/// Restitution of a mallet strike.
pub const HIT_RESTITUTION: f32 = 0.95;

/// Fraction of the distance to the pointer a mallet covers each tick.
pub const MALLET_FOLLOW: f32 = 0.35;
/// Fraction of the distance to received remote state blended in per message.
pub const REMOTE_BLEND: f32 = 0.3;

pub const TICK_RATE: u32 = 60;
pub const SESSION_CODE_LEN: usize = 5;
