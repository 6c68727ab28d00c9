//! Random outcome table
//!
//! A uniform draw `r` in [0, 1) maps onto four half-open bands:
//!
//! | band          | outcome   | reward |
//! |---------------|-----------|--------|
//! | [0.00, 0.30)  | Fail      | 0      |
//! | [0.30, 0.60)  | BreakEven | 1      |
//! | [0.60, 0.85)  | SmallWin  | 2      |
//! | [0.85, 1.00)  | BigWin    | 5      |

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Discrete result of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Fail,
    BreakEven,
    SmallWin,
    BigWin,
}

/// Upper (exclusive) band edges, in table order
const BANDS: [(f64, Outcome); 4] = [
    (0.30, Outcome::Fail),
    (0.60, Outcome::BreakEven),
    (0.85, Outcome::SmallWin),
    (1.00, Outcome::BigWin),
];

impl Outcome {
    pub const ALL: [Outcome; 4] = [
        Outcome::Fail,
        Outcome::BreakEven,
        Outcome::SmallWin,
        Outcome::BigWin,
    ];

    /// Map a draw in [0, 1) to its outcome. Out-of-range draws are clamped.
    pub fn from_draw(r: f64) -> Self {
        let r = if r.is_nan() { 0.0 } else { r.clamp(0.0, 1.0) };
        BANDS
            .iter()
            .find(|(upper, _)| r < *upper)
            .map(|(_, outcome)| *outcome)
            .unwrap_or(Outcome::BigWin)
    }

    /// Coins credited for this outcome
    pub fn reward(&self) -> u32 {
        match self {
            Outcome::Fail => 0,
            Outcome::BreakEven => 1,
            Outcome::SmallWin => 2,
            Outcome::BigWin => 5,
        }
    }

    /// Probability of this outcome under a uniform draw
    pub fn probability(&self) -> f64 {
        match self {
            Outcome::Fail => 0.30,
            Outcome::BreakEven => 0.30,
            Outcome::SmallWin => 0.25,
            Outcome::BigWin => 0.15,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Fail => "No prize",
            Outcome::BreakEven => "Break even",
            Outcome::SmallWin => "Small win",
            Outcome::BigWin => "Big win!",
        }
    }

    /// True when the claw comes back up holding something
    pub fn is_win(&self) -> bool {
        self.reward() > 0
    }
}

/// Source of uniform draws in [0, 1)
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

/// Draw an outcome from a source
pub fn roll(source: &mut dyn RandomSource) -> Outcome {
    Outcome::from_draw(source.next_unit())
}

/// Seeded PCG source for live play and reproducible runs
#[derive(Debug, Clone)]
pub struct SeededSource {
    rng: Pcg32,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededSource {
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Replays a fixed list of draws, repeating the last one
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    draws: Vec<f64>,
    index: usize,
}

impl ScriptedSource {
    pub fn new(draws: impl Into<Vec<f64>>) -> Self {
        Self {
            draws: draws.into(),
            index: 0,
        }
    }

    /// Number of draws consumed so far
    pub fn consumed(&self) -> usize {
        self.index
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        let r = match self.draws.get(self.index) {
            Some(r) => *r,
            None => self.draws.last().copied().unwrap_or(0.0),
        };
        self.index += 1;
        r
    }
}
