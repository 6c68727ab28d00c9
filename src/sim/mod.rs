//! Deterministic round simulation
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Injected random source only
//! - Coins only through the `Wallet` seam
//! - No rendering or platform dependencies

pub mod input;
pub mod outcome;
pub mod state;
pub mod tick;

pub use input::{ClawBounds, Direction, HeldKeys, KeyAction, apply_movement, map_key};
pub use outcome::{Outcome, RandomSource, ScriptedSource, SeededSource, roll};
pub use state::{ClawPosition, GameEvent, MachineState, PhaseSchedule, RoundPhase};
pub use tick::{TickInput, Wallet, tick};
