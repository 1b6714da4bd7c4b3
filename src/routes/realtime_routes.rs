use axum::{Router, routing::get};
use crate::{AppState, controllers::realtime_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router.route("/alerts/stream", get(realtime_controller::sse_alerts))
}
