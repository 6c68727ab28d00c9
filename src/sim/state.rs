//! Machine state and round phases
//!
//! Everything the round driver mutates lives in [`MachineState`].

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::input::ClawBounds;
use super::outcome::Outcome;
use crate::events::Notification;
use crate::tuning::Tuning;

/// Claw end-effector position. x/z come from input, y from the round phases.
pub type ClawPosition = Vec3;

/// Stage of the current round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Accepting movement and trigger input
    Idle,
    /// Coin insertion animation (cosmetic)
    CoinFlight,
    /// Claw descending to grab height; outcome drawn at the midpoint
    Lowering,
    /// Claw returning to rest height
    Rising,
    /// Reward credited and reported, then back to Idle
    Resolved,
}

impl RoundPhase {
    /// Phase entered when this one completes
    pub fn next(self) -> RoundPhase {
        match self {
            RoundPhase::Idle => RoundPhase::CoinFlight,
            RoundPhase::CoinFlight => RoundPhase::Lowering,
            RoundPhase::Lowering => RoundPhase::Rising,
            RoundPhase::Rising => RoundPhase::Resolved,
            RoundPhase::Resolved => RoundPhase::Idle,
        }
    }

    pub fn accepts_input(self) -> bool {
        self == RoundPhase::Idle
    }
}

/// Per-phase durations in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseSchedule {
    pub coin_flight: f32,
    pub lowering: f32,
    pub rising: f32,
}

impl PhaseSchedule {
    /// Duration of a timed phase. Idle is open-ended, Resolved is instant.
    pub fn duration(&self, phase: RoundPhase) -> Option<f32> {
        match phase {
            RoundPhase::Idle => None,
            RoundPhase::CoinFlight => Some(self.coin_flight),
            RoundPhase::Lowering => Some(self.lowering),
            RoundPhase::Rising => Some(self.rising),
            RoundPhase::Resolved => Some(0.0),
        }
    }

    /// Seconds from trigger to resolution
    pub fn round_length(&self) -> f32 {
        self.coin_flight + self.lowering + self.rising
    }
}

impl From<&Tuning> for PhaseSchedule {
    fn from(tuning: &Tuning) -> Self {
        Self {
            coin_flight: tuning.coin_flight_secs,
            lowering: tuning.lowering_secs,
            rising: tuning.rising_secs,
        }
    }
}

/// Events produced by a tick, in order
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PhaseChanged { from: RoundPhase, to: RoundPhase },
    OutcomeDrawn(Outcome),
    /// Something for the UI to show
    Notify(Notification),
}

/// Complete machine state for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineState {
    pub claw: ClawPosition,
    pub phase: RoundPhase,
    /// Seconds spent in the current phase
    pub phase_elapsed: f32,
    /// Claw is carrying a prize (shown until the next round starts)
    pub holding: bool,
    /// Outcome of the round in flight, drawn halfway down
    pub outcome: Option<Outcome>,
    /// Rounds completed this session
    pub rounds_played: u32,
    pub bounds: ClawBounds,
    pub schedule: PhaseSchedule,
    pub speed: f32,
    pub rest_height: f32,
    pub grab_height: f32,
    /// Claw start position, used on reset
    initial_claw: ClawPosition,
}

impl MachineState {
    pub fn new(tuning: &Tuning) -> Self {
        let initial_claw = tuning.initial_claw();
        Self {
            claw: initial_claw,
            phase: RoundPhase::Idle,
            phase_elapsed: 0.0,
            holding: false,
            outcome: None,
            rounds_played: 0,
            bounds: ClawBounds::new(tuning.limit_x, tuning.limit_z),
            schedule: PhaseSchedule::from(tuning),
            speed: tuning.claw_speed,
            rest_height: tuning.rest_height,
            grab_height: tuning.grab_height,
            initial_claw,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.phase == RoundPhase::Idle
    }

    /// Progress through the current timed phase, 0..=1
    pub fn phase_progress(&self) -> f32 {
        match self.schedule.duration(self.phase) {
            Some(d) if d > 0.0 => (self.phase_elapsed / d).clamp(0.0, 1.0),
            Some(_) => 1.0,
            None => 0.0,
        }
    }

    /// Back to the session-start state (used on logout)
    pub fn reset(&mut self) {
        self.claw = self.initial_claw;
        self.phase = RoundPhase::Idle;
        self.phase_elapsed = 0.0;
        self.holding = false;
        self.outcome = None;
        self.rounds_played = 0;
    }
}
