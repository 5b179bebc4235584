//! Table physics: puck motion, mallet strikes and rail bounces.
//!
//! Units are table pixels and velocities are pixels per tick. Every function
//! here is deterministic so two peers fed the same state step identically;
//! they still drift apart in practice because each peer steps its own copy.

use crate::{
    FRICTION, GOAL_HEIGHT, HIT_RESTITUTION, MALLET_FOLLOW, MALLET_MASS, MALLET_RADIUS, PUCK_MASS,
    PUCK_RADIUS, TABLE_HEIGHT, TABLE_WIDTH, WALL_RESTITUTION,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const LOCAL_MALLET_COLOR: Rgb = Rgb(0xfc, 0xa3, 0x11);
pub const REMOTE_MALLET_COLOR: Rgb = Rgb(0xe5, 0xe5, 0xe5);
pub const PUCK_COLOR: Rgb = Rgb(0x00, 0xd1, 0xff);

/// Goal mouth the puck went into, seen from the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    /// The local player's own goal.
    Left,
    /// The opponent's goal.
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mallet {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    /// Displacement over the last tick.
    pub vx: f32,
    pub vy: f32,
    pub color: Rgb,
}

impl Mallet {
    pub fn new(x: f32, y: f32, color: Rgb) -> Self {
        Self {
            x,
            y,
            r: MALLET_RADIUS,
            vx: 0.0,
            vy: 0.0,
            color,
        }
    }

    /// Moves a fraction of the way toward `(target_x, target_y)` and records
    /// the resulting displacement as the mallet's velocity.
    pub fn follow(&mut self, target_x: f32, target_y: f32, left_half: bool) {
        let (prev_x, prev_y) = (self.x, self.y);

        self.x += (target_x - self.x) * MALLET_FOLLOW;
        self.y += (target_y - self.y) * MALLET_FOLLOW;
        clamp_mallet(self, left_half);

        self.vx = self.x - prev_x;
        self.vy = self.y - prev_y;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Puck {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    pub vx: f32,
    pub vy: f32,
    pub color: Rgb,
}

impl Puck {
    pub fn new() -> Self {
        Self {
            x: TABLE_WIDTH / 2.0,
            y: TABLE_HEIGHT / 2.0,
            r: PUCK_RADIUS,
            vx: 0.0,
            vy: 0.0,
            color: PUCK_COLOR,
        }
    }

    /// Puts the puck back on the center spot at rest.
    pub fn reset(&mut self) {
        self.x = TABLE_WIDTH / 2.0;
        self.y = TABLE_HEIGHT / 2.0;
        self.vx = 0.0;
        self.vy = 0.0;
    }

    /// Linear motion for one tick followed by friction damping.
    pub fn advance(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
        self.vx *= FRICTION;
        self.vy *= FRICTION;
    }

    pub fn speed(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }
}

impl Default for Puck {
    fn default() -> Self {
        Self::new()
    }
}

pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Keeps a mallet on the table, and on the left half when `left_half` is set.
pub fn clamp_mallet(mallet: &mut Mallet, left_half: bool) {
    let max_x = if left_half {
        TABLE_WIDTH / 2.0 - mallet.r
    } else {
        TABLE_WIDTH - mallet.r
    };

    mallet.x = mallet.x.clamp(mallet.r, max_x);
    mallet.y = mallet.y.clamp(mallet.r, TABLE_HEIGHT - mallet.r);
}

pub fn check_collision(mallet: &Mallet, puck: &Puck) -> bool {
    let dx = puck.x - mallet.x;
    let dy = puck.y - mallet.y;
    let min_distance = mallet.r + puck.r;

    dx * dx + dy * dy < min_distance * min_distance
}

/// Pushes the puck out of the mallet and applies the strike impulse.
///
/// The impulse uses the relative velocity along the contact normal and is
/// only applied while the bodies are closing. Returns whether the bodies were
/// in contact.
pub fn resolve_collision(mallet: &Mallet, puck: &mut Puck) -> bool {
    if !check_collision(mallet, puck) {
        return false;
    }

    let dx = puck.x - mallet.x;
    let dy = puck.y - mallet.y;
    let distance = (dx * dx + dy * dy).sqrt();
    let min_distance = mallet.r + puck.r;

    if distance < 0.001 {
        puck.x = mallet.x + min_distance;
        return true;
    }

    let nx = dx / distance;
    let ny = dy / distance;

    let overlap = min_distance - distance;
    puck.x += nx * overlap;
    puck.y += ny * overlap;

    let rel_v = (puck.vx - mallet.vx) * nx + (puck.vy - mallet.vy) * ny;
    if rel_v < 0.0 {
        let impulse = -(1.0 + HIT_RESTITUTION) * rel_v / (1.0 / PUCK_MASS + 1.0 / MALLET_MASS);
        puck.vx += impulse * nx / PUCK_MASS;
        puck.vy += impulse * ny / PUCK_MASS;
    }

    true
}

/// Bounces the puck off the rails and reports a goal once its center crosses
/// the goal line inside a goal mouth.
pub fn handle_walls(puck: &mut Puck) -> Option<Goal> {
    let in_mouth = (puck.y - TABLE_HEIGHT / 2.0).abs() < GOAL_HEIGHT / 2.0;

    if in_mouth {
        if puck.x < 0.0 {
            return Some(Goal::Left);
        }
        if puck.x > TABLE_WIDTH {
            return Some(Goal::Right);
        }
    } else {
        if puck.x - puck.r < 0.0 {
            puck.x = puck.r;
            puck.vx = -puck.vx * WALL_RESTITUTION;
        }
        if puck.x + puck.r > TABLE_WIDTH {
            puck.x = TABLE_WIDTH - puck.r;
            puck.vx = -puck.vx * WALL_RESTITUTION;
        }
    }

    if puck.y - puck.r < 0.0 {
        puck.y = puck.r;
        puck.vy = -puck.vy * WALL_RESTITUTION;
    }
    if puck.y + puck.r > TABLE_HEIGHT {
        puck.y = TABLE_HEIGHT - puck.r;
        puck.vy = -puck.vy * WALL_RESTITUTION;
    }

    None
}
