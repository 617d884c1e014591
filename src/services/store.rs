//! Race board state container.
//!
//! Architecture:
//! - One actor task owns [`RaceUiState`] and the last fetched race list, and
//!   processes intents, timer events and fetch completions from a single
//!   mailbox, in order.
//! - Fetches run as separate tasks and post their result back into the
//!   mailbox, so the actor never waits on the network.
//! - Each fetch is tagged with a request id; only the latest one may change
//!   state. Older responses (e.g. for a filter that has since changed) are
//!   dropped.
//! - State is published through a `watch` channel; one-shot side effects go
//!   through a bounded `mpsc` channel to a single consumer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use utoipa::ToSchema;

use crate::clock::SharedClock;
use crate::domain::display::RaceDisplayMapper;
use crate::domain::models::{CategoryId, Race, RaceDisplayModel};
use crate::errors::DataError;
use crate::services::next_races::{is_expired, NextRacesUseCase};
use crate::services::timer::{TimerController, TimerEvent};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Races shown on the board unless configured otherwise.
pub const DEFAULT_RACE_COUNT: usize = 5;

/// Default full refresh cadence.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Default countdown recomputation cadence.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

const MAILBOX_CAPACITY: usize = 64;
const SIDE_EFFECT_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// Contract: state, intents, side effects
// ---------------------------------------------------------------------------

/// Snapshot of the race board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct RaceUiState {
    /// A load (initial or filter change) is in flight
    pub is_loading: bool,
    /// A refresh is in flight; `display_races` stays visible meanwhile
    pub is_refreshing: bool,
    /// Races to show, ascending by advertised start
    pub display_races: Vec<RaceDisplayModel>,
    /// Active category filter; empty means all categories
    pub selected_categories: BTreeSet<CategoryId>,
    /// Message of the last failed fetch, cleared by the next success
    pub error: Option<String>,
}

/// User actions accepted by the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RaceIntent {
    LoadRaces,
    RefreshRaces,
    ToggleCategory { category: CategoryId },
    ClearFilters,
}

/// Notifications delivered once to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RaceSideEffect {
    ShowError { message: String },
    ShowRefreshComplete,
}

/// Tunables for one board session.
#[derive(Debug, Clone, Copy)]
pub struct StoreSettings {
    pub race_count: usize,
    pub tick_interval: Duration,
    pub refresh_interval: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            race_count: DEFAULT_RACE_COUNT,
            tick_interval: DEFAULT_TICK_INTERVAL,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

/// The store task has ended; no more intents are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("race store is closed")]
pub struct StoreClosed;

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    Load,
    Refresh,
}

#[derive(Debug)]
struct FetchCompleted {
    request_id: u64,
    kind: FetchKind,
    result: Result<Vec<Race>, DataError>,
}

#[derive(Debug)]
enum StoreMessage {
    Intent(RaceIntent),
    Timer(TimerEvent),
    Completed(FetchCompleted),
    Shutdown,
}

impl From<TimerEvent> for StoreMessage {
    fn from(event: TimerEvent) -> Self {
        StoreMessage::Timer(event)
    }
}

/// Cloneable access to a running store: send intents, read snapshots.
#[derive(Debug, Clone)]
pub struct RaceStoreHandle {
    mailbox: mpsc::Sender<StoreMessage>,
    state: watch::Receiver<RaceUiState>,
}

impl RaceStoreHandle {
    pub async fn dispatch(&self, intent: RaceIntent) -> Result<(), StoreClosed> {
        self.mailbox
            .send(StoreMessage::Intent(intent))
            .await
            .map_err(|_| StoreClosed)
    }

    /// Current state.
    pub fn snapshot(&self) -> RaceUiState {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes.
    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<RaceUiState> {
        self.state.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.mailbox.is_closed()
    }
}

/// Owner of a board session. Dropping it without [`RaceStore::shutdown`]
/// leaves the session running.
#[derive(Debug)]
pub struct RaceStore {
    handle: RaceStoreHandle,
    task: JoinHandle<()>,
}

impl RaceStore {
    /// Start a session: the store loads races immediately and starts its
    /// timers. Returns the store and the side-effect receiver.
    pub fn spawn(
        use_case: NextRacesUseCase,
        clock: SharedClock,
        settings: StoreSettings,
    ) -> (Self, mpsc::Receiver<RaceSideEffect>) {
        let (mailbox_tx, mailbox_rx) = mpsc::channel(MAILBOX_CAPACITY);
        let (state_tx, state_rx) = watch::channel(RaceUiState::default());
        let (effects_tx, effects_rx) = mpsc::channel(SIDE_EFFECT_CAPACITY);

        let actor = StoreActor {
            state: RaceUiState::default(),
            races: Vec::new(),
            latest_request: 0,
            fetches: JoinSet::new(),
            timers: TimerController::new(settings.tick_interval, settings.refresh_interval),
            mapper: RaceDisplayMapper::new(clock.clone()),
            clock,
            use_case,
            race_count: settings.race_count,
            mailbox: mailbox_tx.clone(),
            state_tx,
            effects_tx,
        };
        let task = tokio::spawn(actor.run(mailbox_rx));

        let store = Self {
            handle: RaceStoreHandle {
                mailbox: mailbox_tx,
                state: state_rx,
            },
            task,
        };
        (store, effects_rx)
    }

    pub fn handle(&self) -> RaceStoreHandle {
        self.handle.clone()
    }

    /// End the session: stop timers, drop in-flight fetches, wait for the task.
    pub async fn shutdown(self) {
        if self.handle.mailbox.send(StoreMessage::Shutdown).await.is_err() {
            tracing::debug!("Race store already stopped");
        }
        if let Err(e) = self.task.await {
            tracing::error!("Race store task failed: {}", e);
        }
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct StoreActor {
    state: RaceUiState,
    /// Last successfully fetched races, source for countdown ticks.
    races: Vec<Race>,
    latest_request: u64,
    fetches: JoinSet<()>,
    timers: TimerController,
    mapper: RaceDisplayMapper,
    clock: SharedClock,
    use_case: NextRacesUseCase,
    race_count: usize,
    mailbox: mpsc::Sender<StoreMessage>,
    state_tx: watch::Sender<RaceUiState>,
    effects_tx: mpsc::Sender<RaceSideEffect>,
}

impl StoreActor {
    async fn run(mut self, mut mailbox: mpsc::Receiver<StoreMessage>) {
        tracing::info!("Race store started");
        self.handle_intent(RaceIntent::LoadRaces);
        self.timers.start(self.mailbox.clone());

        while let Some(message) = mailbox.recv().await {
            match message {
                StoreMessage::Intent(intent) => self.handle_intent(intent),
                StoreMessage::Timer(TimerEvent::CountdownTick) => self.tick(),
                StoreMessage::Timer(TimerEvent::Refresh) => self.refresh(),
                StoreMessage::Completed(done) => self.complete(done),
                StoreMessage::Shutdown => break,
            }
        }

        self.timers.stop();
        self.fetches.abort_all();
        tracing::info!("Race store stopped");
    }

    fn handle_intent(&mut self, intent: RaceIntent) {
        tracing::debug!("Intent: {:?}", intent);
        match intent {
            RaceIntent::LoadRaces => self.load(),
            RaceIntent::RefreshRaces => self.refresh(),
            RaceIntent::ToggleCategory { category } => {
                let mut selected = self.state.selected_categories.clone();
                if !selected.remove(&category) {
                    selected.insert(category);
                }
                self.update(|s| s.selected_categories = selected);
                self.load();
            }
            RaceIntent::ClearFilters => {
                self.update(|s| s.selected_categories.clear());
                self.load();
            }
        }
    }

    fn load(&mut self) {
        self.update(|s| {
            s.is_loading = true;
            s.error = None;
        });
        self.start_fetch(FetchKind::Load);
    }

    fn refresh(&mut self) {
        self.update(|s| s.is_refreshing = true);
        self.start_fetch(FetchKind::Refresh);
    }

    fn start_fetch(&mut self, kind: FetchKind) {
        while self.fetches.try_join_next().is_some() {}

        self.latest_request += 1;
        let request_id = self.latest_request;
        let use_case = self.use_case.clone();
        let categories = self.state.selected_categories.clone();
        let count = self.race_count;
        let mailbox = self.mailbox.clone();

        self.fetches.spawn(async move {
            let result = use_case.execute(count, &categories).await;
            let done = FetchCompleted {
                request_id,
                kind,
                result,
            };
            // The store may have shut down while we were fetching.
            let _ = mailbox.send(StoreMessage::Completed(done)).await;
        });
    }

    fn complete(&mut self, done: FetchCompleted) {
        if done.request_id != self.latest_request {
            tracing::debug!(
                "Discarding stale {:?} result (request {}, latest {})",
                done.kind,
                done.request_id,
                self.latest_request
            );
            return;
        }

        match done.result {
            Ok(races) => {
                tracing::debug!("{:?} complete: {} races", done.kind, races.len());
                self.races = races;
                let display = self.mapper.to_display_models(&self.races);
                self.update(|s| {
                    s.is_loading = false;
                    s.is_refreshing = false;
                    s.display_races = display;
                    s.error = None;
                });
                if done.kind == FetchKind::Refresh {
                    self.emit(RaceSideEffect::ShowRefreshComplete);
                }
            }
            Err(e) => {
                match e.detail() {
                    Some(detail) => tracing::warn!("{:?} failed: {} ({})", done.kind, e, detail),
                    None => tracing::warn!("{:?} failed: {}", done.kind, e),
                }
                // A failed filter change must not leave other categories up.
                self.retain_visible(self.clock.now());
                let display = self.mapper.to_display_models(&self.races);
                let message = e.to_string();
                self.update(|s| {
                    s.is_loading = false;
                    s.is_refreshing = false;
                    s.display_races = display;
                    s.error = Some(message.clone());
                });
                self.emit(RaceSideEffect::ShowError { message });
            }
        }
    }

    /// Recompute countdowns from the held races; no network call. Races past
    /// the expiry grace period are dropped here too, so the board never shows
    /// them while waiting for the next refresh.
    fn tick(&mut self) {
        self.retain_visible(self.clock.now());
        let display = self.mapper.to_display_models(&self.races);
        if display != self.state.display_races {
            self.update(|s| s.display_races = display);
        }
    }

    /// Keep only races the board may show: not expired and, while a filter
    /// is active, in one of the selected categories.
    fn retain_visible(&mut self, now: DateTime<Utc>) {
        let selected = &self.state.selected_categories;
        self.races.retain(|race| {
            !is_expired(race, now) && (selected.is_empty() || selected.contains(&race.category))
        });
    }

    /// Apply a transition and publish the new snapshot.
    fn update(&mut self, transform: impl FnOnce(&mut RaceUiState)) {
        transform(&mut self.state);
        self.state_tx.send_replace(self.state.clone());
    }

    /// Never blocks: a consumer that stops draining loses effects, the board
    /// keeps running.
    fn emit(&self, effect: RaceSideEffect) {
        match self.effects_tx.try_send(effect) {
            Ok(()) => {}
            Err(TrySendError::Full(effect)) => {
                tracing::warn!("Side-effect consumer is lagging, dropped {:?}", effect)
            }
            Err(TrySendError::Closed(_)) => tracing::debug!("Side effect dropped: no consumer"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
