//! Server-Sent Events for display updates

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /events - SSE stream of every ScannerEvent
///
/// Frontends flash on `ScanAccepted`, redraw on `DisplayUpdated`, navigate on
/// `OpenPageRequested` and notify on `Toast`.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    plamo_common::sse::create_event_sse_stream(&state.event_bus, "plamo-scanner")
}
