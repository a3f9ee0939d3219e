//! Server-Sent Events (SSE) stream for real-time updates.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use litehub_app::ports::{DeviceRepository, EntityRepository, EventPublisher, Integration};

use crate::state::AppState;

/// `GET /api/events/stream`: SSE stream of real-time domain events.
///
/// Each domain event is sent as a JSON `data:` frame, named after its
/// event type. The stream ends when the client disconnects.
pub async fn stream<ER, DR, EP, I>(
    State(state): State<AppState<ER, DR, EP, I>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>
where
    ER: EntityRepository + Send + Sync + 'static,
    DR: DeviceRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    I: Integration + Send + Sync + 'static,
{
    let event_rx = state.event_bus.subscribe();
    let event_stream = BroadcastStream::new(event_rx).filter_map(|result| match result {
        Ok(event) => match Event::default()
            .event(event_name(&event))
            .json_data(&event)
        {
            Ok(frame) => Some(Ok(frame)),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize event for SSE stream");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(n)) => {
            tracing::warn!(skipped = n, "SSE subscriber lagged, some events were dropped");
            None
        }
    });

    Sse::new(event_stream).keep_alive(KeepAlive::default())
}

fn event_name(event: &litehub_domain::event::Event) -> String {
    serde_json::to_value(event.event_type)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "event".to_string())
}
