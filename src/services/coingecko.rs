use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::FetchError,
    models::AssetClass,
    services::price_source::{PriceMap, PriceSource},
};

#[derive(Clone)]
pub struct CoinGeckoClient {
    http: Client,
    base_url: String,
}

// simple/price payload: { "bitcoin": { "usd": 21000.0 }, ... }
#[derive(Debug, Deserialize)]
struct UsdQuote {
    usd: Option<f64>,
}

impl CoinGeckoClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// One batched request for all coin ids.
    pub async fn simple_price(&self, ids: &BTreeSet<String>) -> Result<PriceMap, FetchError> {
        if ids.is_empty() {
            return Ok(PriceMap::new());
        }

        let url = format!("{}/simple/price", self.base_url.trim_end_matches('/'));
        let joined = ids.iter().map(String::as_str).collect::<Vec<_>>().join(",");

        tracing::debug!(%url, ids = %joined, "requesting CoinGecko prices");

        let res = self
            .http
            .get(&url)
            .query(&[("ids", joined.as_str()), ("vs_currencies", "usd")])
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                source_name: "CoinGecko",
                status,
                body,
            });
        }

        let body = res.json::<HashMap<String, UsdQuote>>().await?;

        Ok(body
            .into_iter()
            .filter_map(|(coin, quote)| quote.usd.map(|px| (coin, px)))
            .collect())
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn fetch(&self, _class: AssetClass, symbols: &BTreeSet<String>) -> Result<PriceMap, FetchError> {
        self.simple_price(symbols).await
    }
}
