use axum::{
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::{AppState, models::CurrentUser};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    // user identity (phone number)
    pub phone: String,
    // expiry (unix timestamp seconds)
    pub exp: usize,
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    raw.strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Verifies an HS256 token and returns the identity it carries.
pub fn verify_token(secret: &str, token: &str) -> Option<CurrentUser> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .ok()?;

    let phone = data.claims.phone.trim().to_string();
    if phone.is_empty() {
        return None;
    }
    Some(CurrentUser { phone })
}

/// Reads the token from the auth cookie, falling back to a bearer header,
/// and stores the caller in request extensions.
pub async fn inject_current_user(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = jar
        .get(&state.settings.jwt_cookie_name)
        .map(|c| c.value().to_string())
        .or_else(|| bearer_token(req.headers()));

    if let Some(token) = token {
        match verify_token(&state.settings.jwt_secret, &token) {
            Some(user) => {
                req.extensions_mut().insert(user);
            }
            None => tracing::debug!("rejected invalid auth token"),
        }
    }

    next.run(req).await
}

fn is_public_path(path: &str) -> bool {
    matches!(path, "/" | "/health" | "/metrics")
}

pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    if is_public_path(req.uri().path()) || req.extensions().get::<CurrentUser>().is_some() {
        return next.run(req).await;
    }

    (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
}
