//! Keyboard input mapping
//!
//! Held directional keys move the claw by a fixed amount per tick on each
//! axis independently. Diagonals are additive, not normalized.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Directional control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Away from the player (z decreasing)
    Forward,
    /// Toward the player (z increasing)
    Backward,
    /// x decreasing
    Left,
    /// x increasing
    Right,
}

/// What a physical key does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Move(Direction),
    /// Insert a coin and drop the claw
    Trigger,
}

/// Map a `KeyboardEvent.key` (or `.code` for Space) to an action
pub fn map_key(key: &str) -> Option<KeyAction> {
    match key {
        "ArrowUp" | "w" | "W" => Some(KeyAction::Move(Direction::Forward)),
        "ArrowDown" | "s" | "S" => Some(KeyAction::Move(Direction::Backward)),
        "ArrowLeft" | "a" | "A" => Some(KeyAction::Move(Direction::Left)),
        "ArrowRight" | "d" | "D" => Some(KeyAction::Move(Direction::Right)),
        " " | "Space" => Some(KeyAction::Trigger),
        _ => None,
    }
}

/// Set of directional keys currently held
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldKeys {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl HeldKeys {
    pub fn set(&mut self, dir: Direction, held: bool) {
        match dir {
            Direction::Forward => self.forward = held,
            Direction::Backward => self.backward = held,
            Direction::Left => self.left = held,
            Direction::Right => self.right = held,
        }
    }

    pub fn press(&mut self, dir: Direction) {
        self.set(dir, true);
    }

    pub fn release(&mut self, dir: Direction) {
        self.set(dir, false);
    }

    /// Any directional key held
    pub fn any(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Horizontal travel range of the claw
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClawBounds {
    pub limit_x: f32,
    pub limit_z: f32,
}

impl ClawBounds {
    pub fn new(limit_x: f32, limit_z: f32) -> Self {
        Self { limit_x, limit_z }
    }

    /// Clamp x and z independently; y is untouched
    pub fn clamp(&self, pos: Vec3) -> Vec3 {
        Vec3::new(
            pos.x.clamp(-self.limit_x, self.limit_x),
            pos.y,
            pos.z.clamp(-self.limit_z, self.limit_z),
        )
    }

    pub fn contains(&self, pos: Vec3) -> bool {
        pos.x.abs() <= self.limit_x && pos.z.abs() <= self.limit_z
    }
}

/// Apply one tick of held-key movement. Returns `None` when no key is held.
pub fn apply_movement(pos: Vec3, keys: HeldKeys, speed: f32, bounds: ClawBounds) -> Option<Vec3> {
    if !keys.any() {
        return None;
    }

    let mut next = pos;
    if keys.forward {
        next.z -= speed;
    }
    if keys.backward {
        next.z += speed;
    }
    if keys.left {
        next.x -= speed;
    }
    if keys.right {
        next.x += speed;
    }
    Some(bounds.clamp(next))
}
