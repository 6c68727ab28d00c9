//! Account records as stored at `users/{username}`

use chrono::{DateTime, FixedOffset, Offset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::consts::STORE_UTC_OFFSET_SECS;

/// A player account. Field names match the store's camelCase layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Lowercased, validated username (also the record key)
    pub username: String,
    /// Hex-encoded SHA-256 of the password
    pub password_hash: String,
    pub coins: u32,
    /// ISO-8601 in UTC+8
    pub created_at: String,
    /// ISO-8601 in UTC+8
    pub updated_at: String,
}

impl Account {
    /// Build a fresh account; `username` must already be normalized
    pub fn new(username: &str, password: &str, coins: u32, now: DateTime<FixedOffset>) -> Self {
        let stamp = format_timestamp(now);
        Self {
            username: username.to_string(),
            password_hash: hash_password(password),
            coins,
            created_at: stamp.clone(),
            updated_at: stamp,
        }
    }

    /// Check a clear-text password against the stored digest
    pub fn verify_password(&self, password: &str) -> bool {
        self.password_hash.eq_ignore_ascii_case(&hash_password(password))
    }

    /// Set the balance and bump `updated_at`
    pub fn set_coins(&mut self, coins: u32, now: DateTime<FixedOffset>) {
        self.coins = coins;
        self.updated_at = format_timestamp(now);
    }
}

/// Store path for a username
pub fn record_path(username: &str) -> String {
    format!("users/{}", username)
}

/// Hex-encoded SHA-256 digest of a password
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// The fixed store offset (UTC+8)
pub fn store_offset() -> FixedOffset {
    // 8h is always within chrono's +-24h range
    FixedOffset::east_opt(STORE_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Current time in the store offset
pub fn now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&store_offset())
}

/// ISO-8601 with millisecond precision and an explicit `+08:00`
pub fn format_timestamp(at: DateTime<FixedOffset>) -> String {
    at.with_timezone(&store_offset())
        .to_rfc3339_opts(SecondsFormat::Millis, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2025, 6, 5, 4, 30, 0)
            .unwrap()
            .with_timezone(&store_offset())
    }

    #[test]
    fn test_hash_password_is_sha256_hex() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_new_account_never_stores_clear_text() {
        let account = Account::new("alice_01", "hunter2", 10, fixed_time());
        assert_ne!(account.password_hash, "hunter2");
        assert_eq!(account.password_hash.len(), 64);
        assert!(account.verify_password("hunter2"));
        assert!(!account.verify_password("hunter3"));
    }

    #[test]
    fn test_timestamps_use_utc_plus_8() {
        let account = Account::new("bob", "pw", 10, fixed_time());
        assert_eq!(account.created_at, "2025-06-05T12:30:00.000+08:00");
        assert_eq!(account.created_at, account.updated_at);
    }

    #[test]
    fn test_set_coins_bumps_updated_at() {
        let mut account = Account::new("bob", "pw", 10, fixed_time());
        let later = fixed_time() + chrono::Duration::seconds(90);
        account.set_coins(7, later);
        assert_eq!(account.coins, 7);
        assert_eq!(account.updated_at, "2025-06-05T12:31:30.000+08:00");
        assert_eq!(account.created_at, "2025-06-05T12:30:00.000+08:00");
    }

    #[test]
    fn test_serialized_field_names() {
        let account = Account::new("bob", "pw", 3, fixed_time());
        let json = serde_json::to_value(&account).unwrap();
        for key in ["username", "passwordHash", "coins", "createdAt", "updatedAt"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_record_path() {
        assert_eq!(record_path("alice_01"), "users/alice_01");
    }
}
