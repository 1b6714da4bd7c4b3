use std::collections::BTreeSet;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    error::FetchError,
    models::AssetClass,
    services::price_source::{PriceMap, PriceSource},
};

#[derive(Clone)]
pub struct FinnhubClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl FinnhubClient {
    pub fn new(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key,
            base_url: base_url.into(),
        }
    }

    fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub async fn quote(&self, symbol: &str) -> Result<QuoteResponse, FetchError> {
        if !self.has_key() {
            return Err(FetchError::MissingApiKey("FINNHUB_API_KEY"));
        }

        let url = format!("{}/quote", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .get(&url)
            .query(&[("symbol", symbol), ("token", self.api_key.as_str())])
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                source_name: "Finnhub quote",
                status,
                body,
            });
        }

        Ok(res.json::<QuoteResponse>().await?)
    }
}

#[async_trait]
impl PriceSource for FinnhubClient {
    /// Quotes every ticker concurrently. Any failed quote fails the batch;
    /// a zero or non-finite current price counts as "no data" for that ticker.
    async fn fetch(&self, _class: AssetClass, symbols: &BTreeSet<String>) -> Result<PriceMap, FetchError> {
        if !self.has_key() {
            return Err(FetchError::MissingApiKey("FINNHUB_API_KEY"));
        }

        let quotes = try_join_all(symbols.iter().map(|sym| async move {
            self.quote(sym).await.map(|q| (sym.clone(), q.c))
        }))
        .await?;

        Ok(quotes
            .into_iter()
            .filter(|(_, px)| px.is_finite() && *px > 0.0)
            .collect())
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct QuoteResponse {
    // current
    pub c: f64,
    // change
    pub d: Option<f64>,
    // percent change
    pub dp: Option<f64>,
    // high
    pub h: f64,
    // low
    pub l: f64,
    // open
    pub o: f64,
    // previous close
    pub pc: f64,
    // timestamp
    pub t: i64,
}
