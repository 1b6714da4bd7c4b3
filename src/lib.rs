//! Library entrypoint for Market Sentry.
//!
//! The binary only wires things together; integration tests under `tests/`
//! build an `AppState` directly and drive the services and controllers.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod models;

#[path = "middleware/auth.rs"]
pub mod auth;
#[path = "middleware/request_metrics.rs"]
pub mod request_metrics;

pub mod services;

pub mod controllers;
pub mod routes;

use services::{
    aggregator::{PriceAggregator, PriceSources},
    coins::SupportedCoins,
    evaluator::TriggerEvaluator,
    hub::NotificationHub,
    ids::IdGenerator,
    metrics::Metrics,
    store::SharedMarketStore,
};

#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub store: Arc<SharedMarketStore>,
    pub hub: NotificationHub,
    pub coins: Arc<SupportedCoins>,
    pub ids: Arc<dyn IdGenerator>,
    pub aggregator: Arc<PriceAggregator>,
    pub evaluator: Arc<TriggerEvaluator>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        settings: config::Settings,
        coins: SupportedCoins,
        sources: PriceSources,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let store = Arc::new(SharedMarketStore::new());
        let hub = NotificationHub::new(settings.subscriber_queue);

        let aggregator = Arc::new(PriceAggregator::new(
            Arc::clone(&store),
            sources,
            settings.fetch_timeout,
        ));
        let evaluator = Arc::new(TriggerEvaluator::new(Arc::clone(&store), hub.clone()));

        Self {
            settings,
            store,
            hub,
            coins: Arc::new(coins),
            ids,
            aggregator,
            evaluator,
            metrics: Metrics::new(),
        }
    }
}
