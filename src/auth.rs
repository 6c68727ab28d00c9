//! Username/password login with implicit registration
//!
//! An unknown username is registered on first login with the starting
//! balance. A known username must match its stored password digest.

use chrono::{DateTime, FixedOffset};

use crate::account::Account;
use crate::consts::MAX_USERNAME_LEN;
use crate::error::{AuthError, StoreError, ValidationError};
use crate::events::Notification;
use crate::persistence::AccountStore;
use crate::session::Session;

/// Validate a raw username and lowercase it.
///
/// Allowed: ASCII letters, digits, `.` and `_`, at most 20 characters.
/// Surrounding whitespace is ignored.
pub fn normalize_username(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyUsername);
    }
    let len = name.chars().count();
    if len > MAX_USERNAME_LEN {
        return Err(ValidationError::UsernameTooLong {
            len,
            max: MAX_USERNAME_LEN,
        });
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '.' || *c == '_'))
    {
        return Err(ValidationError::InvalidUsernameChar(bad));
    }
    Ok(name.to_ascii_lowercase())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyPassword);
    }
    Ok(())
}

/// Log in, or register if the username is new.
///
/// Returns the new session and the notification to show. On any error no
/// session is created and the store is left untouched.
pub fn login_or_register<S: AccountStore + ?Sized>(
    store: &mut S,
    username: &str,
    password: &str,
    starting_coins: u32,
    now: DateTime<FixedOffset>,
) -> Result<(Session, Notification), AuthError> {
    let username = normalize_username(username)?;
    validate_password(password)?;

    match store.get(&username)? {
        Some(account) => {
            if !account.verify_password(password) {
                log::warn!("Wrong password for {}", username);
                return Err(AuthError::WrongPassword);
            }
            log::info!("{} logged in with {} coins", username, account.coins);
            let notice = Notification::LoginSuccess {
                username: account.username.clone(),
                coins: account.coins,
            };
            Ok((Session::new(account), notice))
        }
        None => {
            let account = Account::new(&username, password, starting_coins, now);
            store.put(&account)?;
            log::info!("Registered {} with {} coins", username, starting_coins);
            let notice = Notification::RegistrationSuccess {
                username: account.username.clone(),
                coins: account.coins,
            };
            Ok((Session::new(account), notice))
        }
    }
}

/// Re-read the session's account from the store (ground truth after a reload)
pub fn refresh<S: AccountStore + ?Sized>(
    store: &S,
    session: &mut Session,
) -> Result<(), StoreError> {
    if let Some(account) = store.get(&session.account.username)? {
        session.account = account;
    }
    Ok(())
}

/// Notification shown for a failed login
pub fn failure_notice(err: &AuthError) -> Notification {
    match err {
        AuthError::Persistence(_) => Notification::StoreFailure,
        other => Notification::LoginFailure {
            reason: other.to_string(),
        },
    }
}
