//! Notifications emitted for the UI layer
//!
//! The core never formats markup; the host decides how each kind is shown.

use serde::{Deserialize, Serialize};

use crate::sim::Outcome;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notification {
    /// Trigger pressed with a balance below the round cost
    InsufficientFunds { balance: u32 },
    /// A round finished and its reward was credited
    RoundResult {
        outcome: Outcome,
        reward: u32,
        balance: u32,
    },
    LoginSuccess { username: String, coins: u32 },
    LoginFailure { reason: String },
    RegistrationSuccess { username: String, coins: u32 },
    /// Generic notice for a failed store write or read
    StoreFailure,
}

impl Notification {
    /// Short headline for toasts and dialogs
    pub fn title(&self) -> &'static str {
        match self {
            Notification::InsufficientFunds { .. } => "Not enough coins",
            Notification::RoundResult { outcome, .. } => outcome.label(),
            Notification::LoginSuccess { .. } => "Welcome back",
            Notification::LoginFailure { .. } => "Login failed",
            Notification::RegistrationSuccess { .. } => "Account created",
            Notification::StoreFailure => "Connection problem",
        }
    }

    /// Body text for toasts and dialogs
    pub fn message(&self) -> String {
        match self {
            Notification::InsufficientFunds { balance } => {
                format!("You have {} coins. Each play costs 1 coin.", balance)
            }
            Notification::RoundResult {
                reward, balance, ..
            } => {
                if *reward == 0 {
                    format!("Better luck next time! Balance: {}", balance)
                } else {
                    format!("You won {} coins! Balance: {}", reward, balance)
                }
            }
            Notification::LoginSuccess { username, coins } => {
                format!("{} has {} coins", username, coins)
            }
            Notification::LoginFailure { reason } => reason.clone(),
            Notification::RegistrationSuccess { username, coins } => {
                format!("{} starts with {} coins", username, coins)
            }
            Notification::StoreFailure => {
                "Your balance could not be saved. It will sync on the next successful update."
                    .to_string()
            }
        }
    }
}
