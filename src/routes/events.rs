//! Server-Sent Events stream of race board side effects.
//!
//! The store delivers each side effect once, to a single receiver.
//! [`forward_side_effects`] owns that receiver, logs every effect, and fans it
//! out to whichever SSE clients are connected at the time.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::routes::AppState;
use crate::services::store::RaceSideEffect;

const SSE_KEEP_ALIVE: Duration = Duration::from_secs(15);
const SSE_CLIENT_BUFFER: usize = 8;

/// Drain the store's side effects into the broadcast hub until the store closes.
pub async fn forward_side_effects(
    mut effects: mpsc::Receiver<RaceSideEffect>,
    hub: broadcast::Sender<RaceSideEffect>,
) {
    while let Some(effect) = effects.recv().await {
        match &effect {
            RaceSideEffect::ShowError { message } => {
                tracing::warn!("Race board error: {}", message)
            }
            RaceSideEffect::ShowRefreshComplete => tracing::info!("Race board refreshed"),
        }
        // No connected clients is fine.
        let _ = hub.send(effect);
    }
    tracing::debug!("Side-effect forwarder finished");
}

/// Stream race board side effects (`show_error`, `show_refresh_complete`).
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Races",
    responses(
        (status = 200, description = "Side-effect event stream", content_type = "text/event-stream", body = RaceSideEffect),
    )
)]
pub async fn side_effect_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!("New side-effect SSE connection");
    to_sse_stream(state.side_effects.subscribe())
}

fn to_sse_stream(
    mut receiver: broadcast::Receiver<RaceSideEffect>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(SSE_CLIENT_BUFFER);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                received = receiver.recv() => {
                    match received {
                        Ok(effect) => {
                            let event = match to_event(&effect) {
                                Some(event) => event,
                                None => continue,
                            };
                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!("SSE client lagged, skipped {} events", skipped);
                        }
                    }
                }
            }
        }
        tracing::info!("Side-effect SSE stream disconnected");
    });

    Sse::new(ReceiverStream::new(rx)).keep_alive(
        KeepAlive::new()
            .interval(SSE_KEEP_ALIVE)
            .text("keep-alive"),
    )
}

fn to_event(effect: &RaceSideEffect) -> Option<Event> {
    let name = match effect {
        RaceSideEffect::ShowError { .. } => "show_error",
        RaceSideEffect::ShowRefreshComplete => "show_refresh_complete",
    };
    match Event::default().event(name).json_data(effect) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::error!("Failed to encode side effect {:?}: {}", effect, e);
            None
        }
    }
}
