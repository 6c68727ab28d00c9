//! Coin ledger
//!
//! Balance changes are applied to the session's cached account first and
//! then written to the store. A failed write is reported but the optimistic
//! in-memory balance is kept; there is no rollback and no automatic retry.

use crate::error::LedgerError;
use crate::persistence::AccountStore;
use crate::session::Session;
use crate::sim::Wallet;

/// Debits and credits against the active session's account
pub struct CoinLedger<'a, S: AccountStore + ?Sized> {
    session: &'a mut Session,
    store: &'a mut S,
}

impl<'a, S: AccountStore + ?Sized> CoinLedger<'a, S> {
    pub fn new(session: &'a mut Session, store: &'a mut S) -> Self {
        Self { session, store }
    }

    /// Current cached balance
    pub fn balance(&self) -> u32 {
        self.session.account.coins
    }

    /// Remove `n` coins. Fails without touching anything when the balance is short.
    pub fn debit(&mut self, n: u32) -> Result<u32, LedgerError> {
        let balance = self.balance();
        if balance < n {
            return Err(LedgerError::InsufficientFunds {
                balance,
                required: n,
            });
        }
        self.commit(balance - n)
    }

    /// Add `n` coins
    pub fn credit(&mut self, n: u32) -> Result<u32, LedgerError> {
        let balance = self.balance().saturating_add(n);
        self.commit(balance)
    }

    fn commit(&mut self, coins: u32) -> Result<u32, LedgerError> {
        self.session.account.set_coins(coins, crate::account::now());
        match self.store.put(&self.session.account) {
            Ok(()) => Ok(coins),
            Err(source) => {
                log::error!(
                    "Failed to persist balance {} for {}: {}",
                    coins,
                    self.session.account.username,
                    source
                );
                Err(LedgerError::Persistence {
                    balance: coins,
                    source,
                })
            }
        }
    }
}

impl<S: AccountStore + ?Sized> Wallet for CoinLedger<'_, S> {
    fn balance(&self) -> u32 {
        CoinLedger::balance(self)
    }

    fn debit(&mut self, n: u32) -> Result<u32, LedgerError> {
        CoinLedger::debit(self, n)
    }

    fn credit(&mut self, n: u32) -> Result<u32, LedgerError> {
        CoinLedger::credit(self, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;
    use crate::persistence::MemoryStore;
    use proptest::prelude::*;

    fn session_with(coins: u32) -> Session {
        Session::new(Account::new("frank", "pw", coins, crate::account::now()))
    }

    #[test]
    fn test_debit_persists_and_updates_cache() {
        let mut store = MemoryStore::new();
        let mut session = session_with(3);

        let balance = CoinLedger::new(&mut session, &mut store).debit(1).unwrap();
        assert_eq!(balance, 2);
        assert_eq!(session.coins(), 2);
        assert_eq!(store.get("frank").unwrap().unwrap().coins, 2);
    }

    #[test]
    fn test_debit_insufficient_leaves_everything_alone() {
        let mut store = MemoryStore::new();
        let mut session = session_with(0);

        let err = CoinLedger::new(&mut session, &mut store).debit(1).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientFunds {
                balance: 0,
                required: 1
            }
        ));
        assert_eq!(session.coins(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_credit_zero_is_allowed() {
        let mut store = MemoryStore::new();
        let mut session = session_with(5);
        let balance = CoinLedger::new(&mut session, &mut store).credit(0).unwrap();
        assert_eq!(balance, 5);
    }

    #[test]
    fn test_failed_write_keeps_optimistic_balance() {
        let mut store = MemoryStore::new();
        store.set_offline(true);
        let mut session = session_with(4);

        let err = CoinLedger::new(&mut session, &mut store).credit(5).unwrap_err();
        assert!(matches!(err, LedgerError::Persistence { balance: 9, .. }));
        assert_eq!(session.coins(), 9);

        // Next successful write syncs the store
        store.set_offline(false);
        CoinLedger::new(&mut session, &mut store).debit(1).unwrap();
        assert_eq!(store.get("frank").unwrap().unwrap().coins, 8);
    }

    proptest! {
        #[test]
        fn prop_debit_then_credit_restores_balance(start in 0u32..10_000, n in 0u32..10_000) {
            prop_assume!(n <= start);
            let mut store = MemoryStore::new();
            let mut session = session_with(start);
            let mut ledger = CoinLedger::new(&mut session, &mut store);

            ledger.debit(n).unwrap();
            let restored = ledger.credit(n).unwrap();
            prop_assert_eq!(restored, start);
        }
    }
}
