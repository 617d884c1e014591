//! Periodic drivers for the race board: a short countdown tick and a longer
//! full refresh. Both run as tokio tasks and are cancelled together.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// What a timer loop asks the store to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Recompute countdown text from the races already held.
    CountdownTick,
    /// Re-run the fetch pipeline.
    Refresh,
}

/// A single repeating task. The first tick fires one full period after start.
#[derive(Debug)]
pub struct PeriodicTask {
    name: &'static str,
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    pub fn new(name: &'static str, period: Duration) -> Self {
        Self {
            name,
            period,
            handle: None,
        }
    }

    /// Start ticking, replacing any loop this task was already running.
    pub fn start<F, Fut>(&mut self, mut on_tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.stop();

        let period = self.period;
        let name = self.name;
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::debug!("Timer '{}' started ({:?})", name, period);
            loop {
                ticker.tick().await;
                on_tick().await;
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("Timer '{}' stopped", self.name);
        }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Owns the countdown tick loop and the refresh loop for one board session.
#[derive(Debug)]
pub struct TimerController {
    countdown: PeriodicTask,
    refresh: PeriodicTask,
}

impl TimerController {
    pub fn new(tick_interval: Duration, refresh_interval: Duration) -> Self {
        Self {
            countdown: PeriodicTask::new("countdown", tick_interval),
            refresh: PeriodicTask::new("refresh", refresh_interval),
        }
    }

    /// Start both loops, delivering their events into `sink`.
    ///
    /// Any loops from an earlier `start` are stopped first, so re-entering a
    /// session never produces duplicate ticks. A closed sink is ignored; the
    /// loops keep running until [`TimerController::stop`].
    pub fn start<M>(&mut self, sink: mpsc::Sender<M>)
    where
        M: From<TimerEvent> + Send + 'static,
    {
        let tick_sink = sink.clone();
        self.countdown.start(move || {
            let sink = tick_sink.clone();
            async move {
                let _ = sink.send(M::from(TimerEvent::CountdownTick)).await;
            }
        });

        self.refresh.start(move || {
            let sink = sink.clone();
            async move {
                let _ = sink.send(M::from(TimerEvent::Refresh)).await;
            }
        });
    }

    pub fn stop(&mut self) {
        self.countdown.stop();
        self.refresh.stop();
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.countdown.is_running() && self.refresh.is_running()
    }
}
