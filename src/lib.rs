//! Claw Machine - a browser claw machine mini-game
//!
//! Core modules:
//! - `sim`: Deterministic round simulation (input, phases, outcome table)
//! - `ledger`: Coin balance updates with optimistic persistence
//! - `auth`: Username validation and login/registration
//! - `persistence`: Account records keyed by username
//! - `scene`: Semantic scene roles fed to the renderer
//! - `renderer`: WebGPU rendering pipeline (wasm only)
//! - `tuning`: Data-driven game balance

pub mod account;
#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod auth;
pub mod error;
pub mod events;
pub mod leaderboard;
pub mod ledger;
pub mod persistence;
#[cfg(target_arch = "wasm32")]
pub mod renderer;
pub mod scene;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use account::Account;
pub use error::{AuthError, LedgerError, StoreError, ValidationError};
pub use events::Notification;
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use ledger::CoinLedger;
pub use session::Session;
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz is plenty for tweened phases)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Coins consumed by one round
    pub const COIN_COST: u32 = 1;
    /// Balance granted to a newly registered account
    pub const STARTING_COINS: u32 = 10;

    /// Username rules
    pub const MAX_USERNAME_LEN: usize = 20;

    /// Number of accounts shown on the leaderboard
    pub const LEADERBOARD_SIZE: usize = 3;

    /// Store timestamps use a fixed UTC+8 offset
    pub const STORE_UTC_OFFSET_SECS: i32 = 8 * 3600;

    /// Track rail sits slightly off-center in the cabinet model
    pub const TRACK_RAIL_X: f32 = 0.011943;
    /// Carriage (claw base and rail) height above the grip
    pub const CARRIAGE_OFFSET_Y: f32 = 0.15;
}

/// Ease-out curve used for claw height tweens, `t` in [0, 1]
#[inline]
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
