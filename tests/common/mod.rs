#![allow(dead_code)]

use std::{
    collections::{BTreeSet, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use marketsentry::{
    AppState, config,
    error::FetchError,
    models::{Alert, AssetClass, Direction},
    services::{
        aggregator::PriceSources,
        coins::SupportedCoins,
        ids::IdGenerator,
        price_source::{PriceMap, PriceSource},
    },
};

pub fn prices(entries: &[(&str, f64)]) -> PriceMap {
    entries.iter().map(|(s, p)| (s.to_string(), *p)).collect()
}

/// Replays queued responses, one per fetch.
#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<PriceMap, String>>>,
    requests: Mutex<Vec<BTreeSet<String>>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<PriceMap, String>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        })
    }

    pub fn push(&self, next: Result<PriceMap, String>) {
        self.script.lock().unwrap().push_back(next);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<BTreeSet<String>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceSource for ScriptedSource {
    async fn fetch(&self, _class: AssetClass, symbols: &BTreeSet<String>) -> Result<PriceMap, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(symbols.clone());

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(map)) => Ok(map),
            Some(Err(msg)) => Err(FetchError::Task(msg)),
            None => Err(FetchError::Task("script exhausted".to_string())),
        }
    }
}

/// Never answers within any reasonable timeout.
pub struct SlowSource {
    pub delay: Duration,
}

#[async_trait]
impl PriceSource for SlowSource {
    async fn fetch(&self, _class: AssetClass, symbols: &BTreeSet<String>) -> Result<PriceMap, FetchError> {
        tokio::time::sleep(self.delay).await;
        Ok(symbols.iter().map(|s| (s.clone(), 1.0)).collect())
    }
}

#[derive(Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl IdGenerator for SequentialIds {
    fn new_id(&self) -> String {
        format!("alert-{}", self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

pub fn sources(
    crypto: Arc<dyn PriceSource>,
    metals: Arc<dyn PriceSource>,
    stocks: Arc<dyn PriceSource>,
) -> PriceSources {
    PriceSources { crypto, metals, stocks }
}

pub fn idle_sources() -> PriceSources {
    sources(
        ScriptedSource::new(vec![]),
        ScriptedSource::new(vec![]),
        ScriptedSource::new(vec![]),
    )
}

pub fn test_settings() -> config::Settings {
    config::Settings {
        jwt_secret: "test-secret".to_string(),
        fetch_timeout: Duration::from_millis(200),
        subscriber_queue: 4,
        ..Default::default()
    }
}

pub fn test_state(sources: PriceSources) -> AppState {
    let coins = SupportedCoins::from_ids(["bitcoin", "ethereum", "dogecoin"]);
    AppState::new(test_settings(), coins, sources, Arc::new(SequentialIds::default()))
}

pub fn alert(id: &str, class: AssetClass, symbol: &str, threshold: f64, direction: Direction) -> Alert {
    Alert {
        id: id.to_string(),
        asset_class: class,
        symbol: symbol.to_string(),
        threshold,
        direction,
        created_at: 0,
    }
}
