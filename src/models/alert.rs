use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Crypto,
    Metal,
    Stock,
}

impl AssetClass {
    pub const ALL: [AssetClass; 3] = [AssetClass::Crypto, AssetClass::Metal, AssetClass::Stock];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetClass::Crypto => "crypto",
            AssetClass::Metal => "metal",
            AssetClass::Stock => "stock",
        }
    }

    /// Canonical spelling of a symbol for this class.
    pub fn normalize_symbol(self, symbol: &str) -> String {
        let sym = symbol.trim();
        match self {
            AssetClass::Stock => sym.to_uppercase(),
            AssetClass::Crypto | AssetClass::Metal => sym.to_lowercase(),
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "crypto" => Ok(AssetClass::Crypto),
            "metal" => Ok(AssetClass::Metal),
            "stock" => Ok(AssetClass::Stock),
            _ => Err(ValidationError::InvalidAssetClass(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Above => "above",
            Direction::Below => "below",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "above" => Ok(Direction::Above),
            "below" => Ok(Direction::Below),
            _ => Err(ValidationError::InvalidDirection(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,

    pub asset_class: AssetClass,
    pub symbol: String,

    // always positive and finite
    pub threshold: f64,
    pub direction: Direction,

    pub created_at: i64,
}

impl Alert {
    /// Strict comparison: a price equal to the threshold never fires.
    pub fn is_met_by(&self, price: f64) -> bool {
        match self.direction {
            Direction::Above => price > self.threshold,
            Direction::Below => price < self.threshold,
        }
    }
}
