//! In-memory source of truth for users, alerts and the latest prices.
//!
//! Everything sits behind one `RwLock`. Readers run in parallel, any write
//! excludes everyone else. Callers never get a reference into the maps that
//! outlives the accessor; data leaves the store as owned clones.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chrono::Utc;
use serde::Serialize;

use crate::models::{Alert, AssetClass, User};

/// Latest known prices for one asset class.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceTable {
    pub prices: HashMap<String, f64>,
    // unix seconds of the last successful fetch, None until the first one
    pub fetched_at: Option<i64>,
}

impl PriceTable {
    pub fn new(prices: HashMap<String, f64>, fetched_at: i64) -> Self {
        Self {
            prices,
            fetched_at: Some(fetched_at),
        }
    }

    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.prices.get(symbol).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceTables {
    pub crypto: PriceTable,
    pub metals: PriceTable,
    pub stocks: PriceTable,
}

impl PriceTables {
    pub fn table(&self, class: AssetClass) -> &PriceTable {
        match class {
            AssetClass::Crypto => &self.crypto,
            AssetClass::Metal => &self.metals,
            AssetClass::Stock => &self.stocks,
        }
    }

    fn table_mut(&mut self, class: AssetClass) -> &mut PriceTable {
        match class {
            AssetClass::Crypto => &mut self.crypto,
            AssetClass::Metal => &mut self.metals,
            AssetClass::Stock => &mut self.stocks,
        }
    }

    /// Missing class data and missing symbols both read as `None`.
    pub fn price(&self, class: AssetClass, symbol: &str) -> Option<f64> {
        self.table(class).get(symbol)
    }
}

/// The data guarded by the store lock.
#[derive(Debug, Default)]
pub struct MarketState {
    users: HashMap<String, User>,
    prices: PriceTables,
}

impl MarketState {
    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    pub fn user_mut(&mut self, id: &str) -> Option<&mut User> {
        self.users.get_mut(id)
    }

    pub fn user_entry(&mut self, id: &str) -> &mut User {
        self.users
            .entry(id.to_string())
            .or_insert_with(|| User::new(id))
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn prices(&self) -> &PriceTables {
        &self.prices
    }

    pub fn price(&self, class: AssetClass, symbol: &str) -> Option<f64> {
        self.prices.price(class, symbol)
    }

    /// Swaps the whole table for `class`; nothing is merged.
    pub fn replace_prices(&mut self, class: AssetClass, table: PriceTable) {
        *self.prices.table_mut(class) = table;
    }
}

#[derive(Debug, Default)]
pub struct SharedMarketStore {
    inner: RwLock<MarketState>,
}

impl SharedMarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    // poisoning is ignored
    fn read_guard(&self) -> RwLockReadGuard<'_, MarketState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, MarketState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` under shared access.
    pub fn read<R>(&self, f: impl FnOnce(&MarketState) -> R) -> R {
        let guard = self.read_guard();
        f(&guard)
    }

    /// Runs `f` under exclusive access.
    pub fn write<R>(&self, f: impl FnOnce(&mut MarketState) -> R) -> R {
        let mut guard = self.write_guard();
        f(&mut guard)
    }

    /// Two-phase transaction: `plan` computes a change set under the read
    /// lock, `apply` commits it under the write lock.
    ///
    /// When `plan` yields `None` the write lock is never taken. The lock is
    /// released between the phases, so `apply` must re-check every
    /// precondition `plan` relied on.
    pub fn transact<P, R>(
        &self,
        plan: impl FnOnce(&MarketState) -> Option<P>,
        apply: impl FnOnce(&mut MarketState, P) -> R,
    ) -> Option<R> {
        let planned = self.read(plan)?;
        Some(self.write(|state| apply(state, planned)))
    }

    pub fn get_or_create_user(&self, id: &str) -> User {
        if let Some(user) = self.read(|s| s.user(id).cloned()) {
            return user;
        }
        self.write(|s| s.user_entry(id).clone())
    }

    pub fn user(&self, id: &str) -> Option<User> {
        self.read(|s| s.user(id).cloned())
    }

    /// Snapshot of every user, ordered by identity.
    pub fn users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.read(|s| s.users().cloned().collect());
        users.sort_by(|a, b| a.id.cmp(&b.id));
        users
    }

    pub fn add_alert(&self, user_id: &str, alert: Alert) {
        self.write(|s| s.user_entry(user_id).active_alerts.push(alert));
    }

    pub fn price_tables(&self) -> PriceTables {
        self.read(|s| s.prices().clone())
    }

    pub fn price(&self, class: AssetClass, symbol: &str) -> Option<f64> {
        self.read(|s| s.price(class, symbol))
    }

    /// Replaces the given class tables together under one write lock.
    pub fn replace_prices(&self, tables: Vec<(AssetClass, HashMap<String, f64>)>) {
        if tables.is_empty() {
            return;
        }
        let now = Utc::now().timestamp();
        self.write(|s| {
            for (class, prices) in tables {
                s.replace_prices(class, PriceTable::new(prices, now));
            }
        });
    }
}
