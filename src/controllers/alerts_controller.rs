use axum::{
    Json,
    extract::{Extension, Form, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState,
    error::ValidationError,
    models::CurrentUser,
    services::alerts_service::{self, NewAlert},
};

#[derive(Deserialize)]
pub struct CreateAlertForm {
    #[serde(rename = "assetType")]
    pub asset_type: String,
    pub symbol: String,
    pub threshold: String,
    pub direction: String,
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response()
}

fn rejected(err: ValidationError) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}

// GET /alerts
pub async fn get_alerts(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Response {
    let Some(Extension(u)) = user else {
        return unauthorized();
    };

    let alerts = alerts_service::user_alerts(&state, &u.phone);
    (StatusCode::OK, Json(alerts)).into_response()
}

// POST /alerts
pub async fn post_create_alert(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Form(form): Form<CreateAlertForm>,
) -> Response {
    let Some(Extension(u)) = user else {
        return unauthorized();
    };

    // an unparsable threshold is reported like a non-positive one
    let threshold = form.threshold.trim().parse::<f64>().unwrap_or(f64::NAN);

    let input = NewAlert {
        asset_class: &form.asset_type,
        symbol: &form.symbol,
        threshold,
        direction: &form.direction,
    };

    match alerts_service::create_alert(&state, &u.phone, input) {
        Ok(alert) => (StatusCode::CREATED, Json(json!({ "id": alert.id }))).into_response(),
        Err(e) => rejected(e),
    }
}

// GET /prices
pub async fn get_prices(State(state): State<AppState>) -> Response {
    (StatusCode::OK, Json(alerts_service::price_tables(&state))).into_response()
}
