//! Roll transactions per account.
//!
//! `Gacha` wraps the stateless [`RollEngine`] with everything a roll
//! request needs: pity persistence, time, randomness and event delivery.
//! A per-account mutex guarantees at most one load→roll→save transaction
//! per account at a time, so concurrent requests can never lose a pity
//! update. Different accounts roll in parallel: the shared RNG is locked
//! only long enough to split off a stream for one transaction, and an
//! account's lock is dropped from the table once nobody holds it.

use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use super::engine::RollEngine;
use super::pity::PityState;
use super::store::PityStore;
use crate::cards::Rarity;
use crate::config::GameData;
use crate::core::{AccountId, Clock, DrawSource, GameRng, Service};
use crate::error::{ConfigError, GachaError};
use crate::events::{Event, EventSink, NullSink, RollResult};

/// Account-serialized roll coordinator.
pub struct Gacha<S> {
    engine: RollEngine,
    store: S,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
    rng: Mutex<GameRng>,
    locks: Mutex<FxHashMap<AccountId, Arc<Mutex<()>>>>,
}

impl<S: PityStore> Gacha<S> {
    /// Create a coordinator that discards events.
    #[must_use]
    pub fn new(engine: RollEngine, store: S, clock: Arc<dyn Clock>, rng: GameRng) -> Self {
        Self {
            engine,
            store,
            clock,
            sink: Arc::new(NullSink),
            rng: Mutex::new(rng),
            locks: Mutex::new(FxHashMap::default()),
        }
    }

    /// Publish every roll result to `sink` (builder pattern).
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub fn engine(&self) -> &RollEngine {
        &self.engine
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Swap in new game data between transactions.
    pub fn reload(&mut self, data: Arc<GameData>) -> Result<(), ConfigError> {
        self.engine.reload(data)
    }

    /// Roll `count` cards for `account` using a stream split from the
    /// shared RNG.
    pub fn roll(&self, account: AccountId, count: usize) -> Result<RollResult, GachaError> {
        self.with_account(account, || {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner()).split();
            self.commit(account, count, &mut rng)
        })
    }

    /// Roll `count` cards for `account` with caller-supplied draws.
    pub fn roll_with(
        &self,
        account: AccountId,
        count: usize,
        draws: &mut impl DrawSource,
    ) -> Result<RollResult, GachaError> {
        self.with_account(account, || self.commit(account, count, draws))
    }

    /// Load, roll, save and publish. The caller holds the account lock.
    fn commit(
        &self,
        account: AccountId,
        count: usize,
        draws: &mut impl DrawSource,
    ) -> Result<RollResult, GachaError> {
        let pity = self.store.load(account)?;
        let at = self.clock.now();
        let (outcomes, next) = self.engine.roll_many(&pity, count, draws, at)?;
        self.store.save(account, &next)?;

        let result = RollResult {
            account,
            outcomes,
            pity: next,
            at,
        };
        if result.best_rarity().is_some_and(|r| r >= Rarity::Legendary) {
            info!(%account, rarity = ?result.best_rarity(), "high rarity pulled");
        }
        debug!(%account, count, pity = result.pity.counter, "roll committed");
        self.sink.publish(Event::Roll(result.clone()));
        Ok(result)
    }

    /// Current pity state for `account`.
    pub fn pity(&self, account: AccountId) -> Result<PityState, GachaError> {
        Ok(self.store.load(account)?)
    }

    /// Tier probabilities for `account`'s next roll.
    pub fn odds(&self, account: AccountId) -> Result<[f64; Rarity::COUNT], GachaError> {
        Ok(self.engine.odds(&self.pity(account)?))
    }

    /// Lower an account's pity counter, e.g. to compensate a refunded roll.
    pub fn compensate(&self, account: AccountId, by: u32) -> Result<PityState, GachaError> {
        self.with_account(account, || {
            let mut state = self.store.load(account)?;
            state.decrement(by);
            self.store.save(account, &state)?;
            info!(%account, by, counter = state.counter, "pity compensated");
            Ok(state)
        })
    }

    /// Run `f` while holding `account`'s lock.
    fn with_account<T>(&self, account: AccountId, f: impl FnOnce() -> T) -> T {
        let lock = self.account_lock(account);
        let result = {
            let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
            f()
        };
        self.release(account, lock);
        result
    }

    fn account_lock(&self, account: AccountId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(account).or_default())
    }

    /// Drop `account`'s table entry if no other transaction holds it.
    ///
    /// Clones are only handed out under the table lock, so a strong count
    /// of one seen here cannot race with a new waiter.
    fn release(&self, account: AccountId, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        drop(lock);
        if locks
            .get(&account)
            .is_some_and(|held| Arc::strong_count(held) == 1)
        {
            locks.remove(&account);
        }
    }
}

impl<S: PityStore> Service for Gacha<S> {
    fn name(&self) -> &'static str {
        "gacha"
    }

    fn initialize(&mut self) -> Result<(), ConfigError> {
        self.engine.initialize()
    }
}
