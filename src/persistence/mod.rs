//! Account persistence
//!
//! Records live at `users/{username}` with the fields of [`Account`].
//! Backends:
//! - `MemoryStore`: in-process map (native builds, tests)
//! - `LocalStore`: browser LocalStorage (wasm only)
//!
//! Writes are last-write-wins; nothing reconciles a failed write with the
//! remote copy until the next successful write or a reload.

pub mod memory;
#[cfg(target_arch = "wasm32")]
pub mod local;

pub use memory::MemoryStore;
#[cfg(target_arch = "wasm32")]
pub use local::LocalStore;

use crate::account::Account;
use crate::error::StoreError;

/// Key-value access to account records
pub trait AccountStore {
    /// Fetch the record for a normalized username
    fn get(&self, username: &str) -> Result<Option<Account>, StoreError>;

    /// Create or overwrite the record keyed by `account.username`
    fn put(&mut self, account: &Account) -> Result<(), StoreError>;

    /// Every stored account, in no particular order
    fn all(&self) -> Result<Vec<Account>, StoreError>;
}
