//! "Get next races" use-case: aggregation followed by expiry and category
//! filtering against the current clock.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::clock::SharedClock;
use crate::domain::models::{CategoryId, Race};
use crate::errors::DataError;
use crate::services::aggregator::RaceAggregator;

/// Seconds after its advertised start that a race stays on the board.
pub const EXPIRY_GRACE_SECS: i64 = 60;

#[derive(Clone)]
pub struct NextRacesUseCase {
    aggregator: RaceAggregator,
    clock: SharedClock,
}

impl NextRacesUseCase {
    pub fn new(aggregator: RaceAggregator, clock: SharedClock) -> Self {
        Self { aggregator, clock }
    }

    /// Fetch and post-process the next `count` races. Errors pass through.
    ///
    /// The clock is read after the fetch completes, so slow responses are
    /// still filtered against the time they arrive.
    pub async fn execute(
        &self,
        count: usize,
        categories: &BTreeSet<CategoryId>,
    ) -> Result<Vec<Race>, DataError> {
        let races = self.aggregator.next_races(count, categories).await?;
        Ok(filter_races(races, count, categories, self.clock.now()))
    }
}

/// Drop expired races, apply the category filter, sort by start, truncate.
pub fn filter_races(
    races: Vec<Race>,
    count: usize,
    categories: &BTreeSet<CategoryId>,
    now: DateTime<Utc>,
) -> Vec<Race> {
    let mut kept: Vec<Race> = races
        .into_iter()
        .filter(|race| !is_expired(race, now))
        .filter(|race| categories.is_empty() || categories.contains(&race.category))
        .collect();
    kept.sort_by_key(|race| race.advertised_start);
    kept.truncate(count);
    kept
}

/// More than [`EXPIRY_GRACE_SECS`] have passed since the advertised start.
pub fn is_expired(race: &Race, now: DateTime<Utc>) -> bool {
    now.timestamp() - race.advertised_start.timestamp() > EXPIRY_GRACE_SECS
}
