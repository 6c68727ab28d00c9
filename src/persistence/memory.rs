//! In-memory account store

use std::collections::BTreeMap;

use super::AccountStore;
use crate::account::{Account, record_path};
use crate::error::StoreError;

/// Map from record path to serialized account.
///
/// Records are kept as JSON so reads exercise the same decode path as the
/// browser store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, String>,
    /// When set, every operation fails with `StoreError::Unavailable`
    offline: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing the connection to the store
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl AccountStore for MemoryStore {
    fn get(&self, username: &str) -> Result<Option<Account>, StoreError> {
        self.check_online()?;
        match self.records.get(&record_path(username)) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn put(&mut self, account: &Account) -> Result<(), StoreError> {
        self.check_online()?;
        let json = serde_json::to_string(account)?;
        self.records.insert(record_path(&account.username), json);
        Ok(())
    }

    fn all(&self) -> Result<Vec<Account>, StoreError> {
        self.check_online()?;
        self.records
            .values()
            .map(|json| serde_json::from_str(json).map_err(StoreError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_then_get() {
        let mut store = MemoryStore::new();
        let account = Account::new("carol", "pw", 4, crate::account::now());
        store.put(&account).unwrap();

        assert_eq!(store.get("carol").unwrap(), Some(account));
        assert_eq!(store.get("dave").unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_put_overwrites() {
        let mut store = MemoryStore::new();
        let mut account = Account::new("carol", "pw", 4, crate::account::now());
        store.put(&account).unwrap();
        account.coins = 9;
        store.put(&account).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("carol").unwrap().unwrap().coins, 9);
    }

    #[test]
    fn test_offline_fails_everything() {
        let mut store = MemoryStore::new();
        store.set_offline(true);
        let account = Account::new("carol", "pw", 4, crate::account::now());

        assert!(matches!(store.put(&account), Err(StoreError::Unavailable(_))));
        assert!(matches!(store.get("carol"), Err(StoreError::Unavailable(_))));
        assert!(matches!(store.all(), Err(StoreError::Unavailable(_))));
    }
}
