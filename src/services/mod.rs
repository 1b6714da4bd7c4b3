use std::sync::Arc;

use crate::config::Settings;

pub mod price_source;
pub mod coingecko;
pub mod finnhub;
pub mod coins;
pub mod ids;

pub mod store;
pub mod aggregator;
pub mod evaluator;
pub mod hub;
pub mod alert_monitor;
pub mod metrics;

pub mod alerts_service;

/// Network-backed sources for crypto and stocks, fixed table for metals.
pub fn live_sources(settings: &Settings) -> aggregator::PriceSources {
    aggregator::PriceSources {
        crypto: Arc::new(coingecko::CoinGeckoClient::new(settings.coingecko_base_url.clone())),
        metals: Arc::new(price_source::FixedPriceSource::metals()),
        stocks: Arc::new(finnhub::FinnhubClient::new(
            settings.finnhub_api_key.clone(),
            settings.finnhub_base_url.clone(),
        )),
    }
}
