//! Server-Sent Events for admin views

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /api/admin/events - live application and role changes
///
/// Streams events:
/// - ConnectionStatus (first frame)
/// - ApplicationChanged
/// - RoleCatalogChanged
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    aimclub_common::sse::create_event_sse_stream("aimclub-recruit", &state.events)
}
