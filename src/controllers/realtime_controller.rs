use std::{convert::Infallible, time::Duration};

use axum::{
    extract::{Extension, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream::Stream;

use crate::{AppState, models::CurrentUser};

// GET /alerts/stream  (SSE)
//
// The subscription lives inside the stream; when the client disconnects
// axum drops the stream and the subscription unregisters itself.
pub async fn sse_alerts(
    State(state): State<AppState>,
    Extension(u): Extension<CurrentUser>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    state.store.get_or_create_user(&u.phone);
    let sub = state.hub.subscribe(&u.phone);

    let stream = futures_util::stream::unfold(sub, |mut sub| async move {
        let evt = sub.recv().await?;
        let event = Event::default().event(&evt.kind).data(evt.to_json());
        Some((Ok(event), sub))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(20))
            .text("keep-alive"),
    )
}
