use std::{collections::HashSet, path::Path};

use serde::Deserialize;

use crate::error::CatalogError;

// catalog rows also carry `symbol` and `name`; only the id is matched
#[derive(Debug, Deserialize)]
struct CoinEntry {
    id: String,
}

/// Coin ids accepted for crypto alerts (CoinGecko ids, e.g. "bitcoin").
#[derive(Debug, Clone, Default)]
pub struct SupportedCoins {
    ids: HashSet<String>,
}

impl SupportedCoins {
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a JSON array of `{id, symbol, name}` objects.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let entries: Vec<CoinEntry> = serde_json::from_str(raw)?;
        Ok(Self::from_ids(entries.into_iter().map(|c| c.id)))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
