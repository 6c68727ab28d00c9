//! Browser LocalStorage account store

use super::AccountStore;
use crate::account::{Account, record_path};
use crate::error::StoreError;

/// Accounts persisted to `window.localStorage`, one key per record path.
pub struct LocalStore {
    storage: web_sys::Storage,
}

impl LocalStore {
    /// Key prefix shared by every record
    const PREFIX: &'static str = "users/";

    /// Open the window's LocalStorage
    pub fn open() -> Result<Self, StoreError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| StoreError::Unavailable("LocalStorage not available".to_string()))?;
        Ok(Self { storage })
    }

    fn read(&self, path: &str) -> Result<Option<Account>, StoreError> {
        let json = self
            .storage
            .get_item(path)
            .map_err(|_| StoreError::Unavailable(format!("read {} failed", path)))?;
        match json {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|_| StoreError::Corrupt {
                    path: path.to_string(),
                }),
            None => Ok(None),
        }
    }
}

impl AccountStore for LocalStore {
    fn get(&self, username: &str) -> Result<Option<Account>, StoreError> {
        self.read(&record_path(username))
    }

    fn put(&mut self, account: &Account) -> Result<(), StoreError> {
        let path = record_path(&account.username);
        let json = serde_json::to_string(account)?;
        self.storage
            .set_item(&path, &json)
            .map_err(|_| StoreError::Unavailable(format!("write {} failed", path)))?;
        log::info!("Saved {} ({} coins)", path, account.coins);
        Ok(())
    }

    fn all(&self) -> Result<Vec<Account>, StoreError> {
        let len = self
            .storage
            .length()
            .map_err(|_| StoreError::Unavailable("LocalStorage length failed".to_string()))?;

        let mut accounts = Vec::new();
        for i in 0..len {
            let Ok(Some(key)) = self.storage.key(i) else {
                continue;
            };
            if !key.starts_with(Self::PREFIX) {
                continue;
            }
            match self.read(&key) {
                Ok(Some(account)) => accounts.push(account),
                Ok(None) => {}
                Err(e) => log::warn!("Skipping record: {}", e),
            }
        }
        Ok(accounts)
    }
}
