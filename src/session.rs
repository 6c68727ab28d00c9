//! Logged-in session context
//!
//! The host owns the single `Session` and passes it into core operations;
//! nothing here is global.

use crate::account::Account;

/// Opaque token for the looping music track owned by the audio layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MusicHandle(pub u32);

#[derive(Debug, Clone)]
pub struct Session {
    /// Cached copy of the stored account
    pub account: Account,
    /// All audio muted
    pub muted: bool,
    /// Currently playing music, if any
    pub music: Option<MusicHandle>,
}

impl Session {
    pub fn new(account: Account) -> Self {
        Self {
            account,
            muted: false,
            music: None,
        }
    }

    pub fn username(&self) -> &str {
        &self.account.username
    }

    pub fn coins(&self) -> u32 {
        self.account.coins
    }

    /// Flip the mute flag, returning the new value
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// End the session, handing back the music handle so the caller can stop it
    pub fn logout(self) -> Option<MusicHandle> {
        log::info!("{} logged out", self.account.username);
        self.music
    }
}
