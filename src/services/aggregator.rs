//! Collects the symbols referenced by active alerts and refreshes the
//! matching price tables.
//!
//! One fetch task per non-empty asset class runs concurrently under its own
//! timeout. A class whose fetch fails keeps last cycle's table.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
    time::Duration,
};

use futures_util::future::join_all;
use tokio::time::timeout;

use crate::{
    error::FetchError,
    models::AssetClass,
    services::{
        price_source::{PriceMap, PriceSource},
        store::{MarketState, SharedMarketStore},
    },
};

/// Distinct symbols per class.
pub type SymbolSets = BTreeMap<AssetClass, BTreeSet<String>>;

#[derive(Clone)]
pub struct PriceSources {
    pub crypto: Arc<dyn PriceSource>,
    pub metals: Arc<dyn PriceSource>,
    pub stocks: Arc<dyn PriceSource>,
}

impl PriceSources {
    pub fn for_class(&self, class: AssetClass) -> Arc<dyn PriceSource> {
        match class {
            AssetClass::Crypto => Arc::clone(&self.crypto),
            AssetClass::Metal => Arc::clone(&self.metals),
            AssetClass::Stock => Arc::clone(&self.stocks),
        }
    }
}

#[derive(Debug)]
pub enum FetchOutcome {
    Updated { symbols: usize },
    Failed(FetchError),
}

impl FetchOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, FetchOutcome::Updated { .. })
    }
}

#[derive(Debug, Default)]
pub struct AggregationReport {
    /// Only classes that had symbols to fetch appear here.
    pub outcomes: BTreeMap<AssetClass, FetchOutcome>,
}

impl AggregationReport {
    /// True when no class had anything to fetch.
    pub fn is_idle(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn outcome(&self, class: AssetClass) -> Option<&FetchOutcome> {
        self.outcomes.get(&class)
    }
}

pub fn gather_symbols(state: &MarketState) -> SymbolSets {
    let mut sets = SymbolSets::new();

    for user in state.users() {
        for alert in &user.active_alerts {
            sets.entry(alert.asset_class)
                .or_default()
                .insert(alert.symbol.clone());
        }
    }

    sets
}

pub struct PriceAggregator {
    store: Arc<SharedMarketStore>,
    sources: PriceSources,
    fetch_timeout: Duration,
}

impl PriceAggregator {
    pub fn new(store: Arc<SharedMarketStore>, sources: PriceSources, fetch_timeout: Duration) -> Self {
        Self {
            store,
            sources,
            fetch_timeout,
        }
    }

    pub fn symbols(&self) -> SymbolSets {
        self.store.read(gather_symbols)
    }

    /// Fetches every needed class and writes the successful ones back.
    /// Returns only after every task finished or timed out.
    pub async fn refresh(&self) -> AggregationReport {
        let symbols = self.symbols();

        if symbols.values().all(|syms| syms.is_empty()) {
            tracing::info!("no symbols to fetch, skipping price refresh");
            return AggregationReport::default();
        }

        let tasks = symbols
            .into_iter()
            .filter(|(_, syms)| !syms.is_empty())
            .map(|(class, syms)| {
                let source = self.sources.for_class(class);
                let limit = self.fetch_timeout;

                let handle = tokio::spawn(async move {
                    match timeout(limit, source.fetch(class, &syms)).await {
                        Ok(res) => res,
                        Err(_) => Err(FetchError::Timeout(limit)),
                    }
                });

                async move {
                    let res = match handle.await {
                        Ok(res) => res,
                        Err(e) => Err(FetchError::Task(e.to_string())),
                    };
                    (class, res)
                }
            });

        let results: Vec<(AssetClass, Result<PriceMap, FetchError>)> = join_all(tasks).await;

        let mut report = AggregationReport::default();
        let mut fresh = Vec::new();

        for (class, res) in results {
            match res {
                Ok(prices) => {
                    tracing::debug!(%class, symbols = prices.len(), "fetched prices");
                    report.outcomes.insert(class, FetchOutcome::Updated { symbols: prices.len() });
                    fresh.push((class, prices));
                }
                Err(e) => {
                    tracing::warn!(%class, error = %e, "price fetch failed, keeping previous table");
                    report.outcomes.insert(class, FetchOutcome::Failed(e));
                }
            }
        }

        self.store.replace_prices(fresh);

        report
    }
}
