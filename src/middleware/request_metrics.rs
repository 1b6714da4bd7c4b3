use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::AppState;

/// Counts every request by method and final status, rejected ones included.
pub async fn track_requests(
    State(state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let res = next.run(req).await;

    state.metrics.record_request(method.as_str(), res.status().as_u16());
    res
}
