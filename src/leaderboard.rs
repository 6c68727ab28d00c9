//! Coin leaderboard
//!
//! Read-only aggregate over every stored account: top 3 by balance.

use serde::{Deserialize, Serialize};

use crate::account::Account;
use crate::consts::LEADERBOARD_SIZE;
use crate::error::StoreError;
use crate::persistence::AccountStore;

/// A single leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub coins: u32,
}

/// Richest accounts, sorted by coins descending
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Rank accounts. Ties are broken by username so the order is stable.
    pub fn from_accounts<'a>(accounts: impl IntoIterator<Item = &'a Account>) -> Self {
        let mut entries: Vec<LeaderboardEntry> = accounts
            .into_iter()
            .map(|a| LeaderboardEntry {
                username: a.username.clone(),
                coins: a.coins,
            })
            .collect();

        entries.sort_by(|a, b| b.coins.cmp(&a.coins).then_with(|| a.username.cmp(&b.username)));
        entries.truncate(LEADERBOARD_SIZE);

        Self { entries }
    }

    /// Query the store
    pub fn load<S: AccountStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        let accounts = store.all()?;
        let board = Self::from_accounts(&accounts);
        log::info!("Leaderboard loaded ({} of {} accounts)", board.len(), accounts.len());
        Ok(board)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 1-indexed rank of a username, if it made the board
    pub fn rank_of(&self, username: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.username == username)
            .map(|i| i + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn account(name: &str, coins: u32) -> Account {
        Account::new(name, "pw", coins, crate::account::now())
    }

    #[test]
    fn test_top_three_descending() {
        let accounts = vec![
            account("ann", 4),
            account("ben", 12),
            account("cat", 0),
            account("dan", 30),
            account("eve", 7),
        ];
        let board = Leaderboard::from_accounts(&accounts);

        let rows: Vec<(&str, u32)> = board
            .entries
            .iter()
            .map(|e| (e.username.as_str(), e.coins))
            .collect();
        assert_eq!(rows, vec![("dan", 30), ("ben", 12), ("eve", 7)]);
        assert_eq!(board.rank_of("ben"), Some(2));
        assert_eq!(board.rank_of("ann"), None);
    }

    #[test]
    fn test_ties_sorted_by_name() {
        let accounts = vec![account("zed", 5), account("amy", 5), account("max", 5)];
        let board = Leaderboard::from_accounts(&accounts);
        assert_eq!(board.entries[0].username, "amy");
        assert_eq!(board.entries[2].username, "zed");
    }

    #[test]
    fn test_fewer_than_three() {
        let board = Leaderboard::from_accounts(&[account("solo", 1)]);
        assert_eq!(board.len(), 1);
        assert!(Leaderboard::from_accounts(&[]).is_empty());
    }

    #[test]
    fn test_load_from_store() {
        let mut store = MemoryStore::new();
        for (name, coins) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
            store.put(&account(name, coins)).unwrap();
        }
        let board = Leaderboard::load(&store).unwrap();
        assert_eq!(board.entries[0].username, "d");
        assert_eq!(board.len(), 3);
    }
}
