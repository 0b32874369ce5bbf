//! Pity persistence seam.

use std::sync::Mutex;

use rustc_hash::FxHashMap;

use super::pity::PityState;
use crate::core::AccountId;
use crate::error::StoreError;

/// Loads and saves pity state per account.
///
/// Implementations only need to be atomic per call; the caller serializes
/// whole load→roll→save transactions per account.
pub trait PityStore: Send + Sync {
    /// State for `account`, or a fresh state if none was saved.
    fn load(&self, account: AccountId) -> Result<PityState, StoreError>;

    fn save(&self, account: AccountId, state: &PityState) -> Result<(), StoreError>;
}

/// In-process store. States are kept in their `bincode` encoding so the
/// round trip matches what a persistent backend would see.
#[derive(Debug, Default)]
pub struct InMemoryPityStore {
    records: Mutex<FxHashMap<AccountId, Vec<u8>>>,
}

impl InMemoryPityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accounts with saved state.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.records.lock().map_err(|_| StoreError::Poisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl PityStore for InMemoryPityStore {
    fn load(&self, account: AccountId) -> Result<PityState, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        match records.get(&account) {
            Some(bytes) => {
                bincode::deserialize(bytes).map_err(|source| StoreError::Decode { account, source })
            }
            None => Ok(PityState::default()),
        }
    }

    fn save(&self, account: AccountId, state: &PityState) -> Result<(), StoreError> {
        let bytes =
            bincode::serialize(state).map_err(|source| StoreError::Encode { account, source })?;
        self.records
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .insert(account, bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn test_missing_account_is_fresh() {
        let store = InMemoryPityStore::new();
        assert_eq!(store.load(AccountId(9)).unwrap(), PityState::default());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_save_load_round_trip() {
        let store = InMemoryPityStore::new();
        let state = PityState {
            counter: 42,
            lifetime_rolls: 310,
            last_roll_at: Some(Utc.with_ymd_and_hms(2024, 3, 9, 8, 30, 0).unwrap()),
        };

        store.save(AccountId(1), &state).unwrap();

        assert_eq!(store.load(AccountId(1)).unwrap(), state);
        assert_eq!(store.load(AccountId(2)).unwrap(), PityState::default());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_corrupt_record_fails_decode() {
        let store = InMemoryPityStore::new();
        store
            .records
            .lock()
            .unwrap()
            .insert(AccountId(5), vec![0xff]);

        assert!(matches!(
            store.load(AccountId(5)),
            Err(StoreError::Decode { .. })
        ));
    }
}
