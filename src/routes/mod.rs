pub mod events;
pub mod health;
pub mod races;

use tokio::sync::broadcast;

use crate::services::store::{RaceSideEffect, RaceStoreHandle};

/// Shared state for the HTTP adapter.
#[derive(Clone)]
pub struct AppState {
    pub store: RaceStoreHandle,
    /// Fan-out of store side effects to connected SSE clients.
    pub side_effects: broadcast::Sender<RaceSideEffect>,
}
