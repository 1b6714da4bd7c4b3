use chrono::Utc;
use serde::Serialize;

use crate::{
    AppState,
    error::ValidationError,
    models::{Alert, AssetClass, Direction, Notification},
    services::store::PriceTables,
};

/// Raw alert request as received from a caller, before validation.
#[derive(Debug, Clone, Copy)]
pub struct NewAlert<'a> {
    pub asset_class: &'a str,
    pub symbol: &'a str,
    pub threshold: f64,
    pub direction: &'a str,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserAlerts {
    pub active: Vec<Alert>,
    pub triggered: Vec<Alert>,
    pub notifications: Vec<Notification>,
}

/// Checks a request in the order asset class, symbol, threshold, direction
/// and reports the first problem found.
pub fn validate(
    state: &AppState,
    input: &NewAlert<'_>,
) -> Result<(AssetClass, String, Direction), ValidationError> {
    let class: AssetClass = input.asset_class.parse()?;

    let symbol = class.normalize_symbol(input.symbol);
    if symbol.is_empty() {
        return Err(ValidationError::MissingSymbol);
    }
    if class == AssetClass::Crypto && !state.coins.contains(&symbol) {
        return Err(ValidationError::UnsupportedCoin(symbol));
    }

    if !input.threshold.is_finite() || input.threshold <= 0.0 {
        return Err(ValidationError::InvalidThreshold);
    }

    let direction: Direction = input.direction.parse()?;

    Ok((class, symbol, direction))
}

/// Validates and appends a new active alert for `user_id`, creating the
/// user on first reference.
pub fn create_alert(
    state: &AppState,
    user_id: &str,
    input: NewAlert<'_>,
) -> Result<Alert, ValidationError> {
    let (asset_class, symbol, direction) = validate(state, &input)?;

    let alert = Alert {
        id: state.ids.new_id(),
        asset_class,
        symbol,
        threshold: input.threshold,
        direction,
        created_at: Utc::now().timestamp(),
    };

    state.store.add_alert(user_id, alert.clone());

    tracing::info!(
        user = %user_id,
        alert = %alert.id,
        class = %alert.asset_class,
        symbol = %alert.symbol,
        threshold = alert.threshold,
        direction = %alert.direction,
        "alert created"
    );

    Ok(alert)
}

/// Current lists for a user; empty for an unknown identity.
pub fn user_alerts(state: &AppState, user_id: &str) -> UserAlerts {
    state
        .store
        .user(user_id)
        .map(|u| UserAlerts {
            active: u.active_alerts,
            triggered: u.triggered_alerts,
            notifications: u.notifications,
        })
        .unwrap_or_default()
}

pub fn price_tables(state: &AppState) -> PriceTables {
    state.store.price_tables()
}
