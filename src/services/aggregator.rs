//! Race aggregation across category-scoped queries.
//!
//! With several categories selected, one request per category is issued in
//! parallel; a failing category contributes nothing instead of failing the
//! whole aggregation. Results are flattened in category ordinal order,
//! deduplicated by race id (first occurrence wins), and sorted by start time.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::domain::models::{CategoryId, Race};
use crate::errors::DataError;
use crate::services::racing_api::RaceDataSource;

/// Extra races requested on top of `count` to survive expiry filtering.
const REQUEST_PADDING: usize = 5;

/// Merges "next races" results from the data source.
#[derive(Clone)]
pub struct RaceAggregator {
    source: Arc<dyn RaceDataSource>,
}

/// Inflated request size: `max(count + 5, count * 1.5)`.
pub fn request_count(count: usize) -> usize {
    (count * 3 / 2).max(count + REQUEST_PADDING)
}

/// Per-category request size when `categories` queries run in parallel.
pub fn per_category_count(count: usize, categories: usize) -> usize {
    if categories == 0 {
        return request_count(count);
    }
    (request_count(count) / categories).max(count)
}

impl RaceAggregator {
    pub fn new(source: Arc<dyn RaceDataSource>) -> Self {
        Self { source }
    }

    /// Fetch, merge, deduplicate, and sort the next races.
    ///
    /// Only the single-request paths (no category or exactly one) can fail.
    pub async fn next_races(
        &self,
        count: usize,
        categories: &BTreeSet<CategoryId>,
    ) -> Result<Vec<Race>, DataError> {
        let races = match categories.len() {
            0 => self.source.fetch_next_races(request_count(count), None).await?,
            1 => {
                let category = categories.iter().next().copied();
                self.source
                    .fetch_next_races(request_count(count), category)
                    .await?
            }
            n => self.fetch_per_category(per_category_count(count, n), categories).await,
        };

        Ok(dedup_and_sort(races))
    }

    async fn fetch_per_category(
        &self,
        per_category: usize,
        categories: &BTreeSet<CategoryId>,
    ) -> Vec<Race> {
        let fetches = categories.iter().map(|&category| {
            let fetch = self.source.fetch_next_races(per_category, Some(category));
            async move {
                match fetch.await {
                    Ok(races) => races,
                    Err(e) => {
                        tracing::warn!(
                            "Category {:?} fetch failed, contributing no races: {}",
                            category,
                            e
                        );
                        Vec::new()
                    }
                }
            }
        });

        // join_all keeps input order, which is the BTreeSet's ordinal order.
        futures::future::join_all(fetches)
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Drop repeated race ids (keeping the first), then stable-sort by start.
fn dedup_and_sort(races: Vec<Race>) -> Vec<Race> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Race> = races
        .into_iter()
        .filter(|race| seen.insert(race.id.clone()))
        .collect();
    unique.sort_by_key(|race| race.advertised_start);
    unique
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use futures::future::BoxFuture;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory data source with scripted per-category responses.
    #[derive(Default)]
    pub struct FakeRaceSource {
        responses: Mutex<HashMap<Option<CategoryId>, Result<Vec<Race>, DataError>>>,
        delays: Mutex<HashMap<Option<CategoryId>, Duration>>,
        calls: Mutex<Vec<(usize, Option<CategoryId>)>>,
    }

    impl FakeRaceSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(&self, category: Option<CategoryId>, result: Result<Vec<Race>, DataError>) {
            self.responses.lock().unwrap().insert(category, result);
        }

        /// Make responses for `category` arrive after `delay` (tokio time).
        pub fn delay(&self, category: Option<CategoryId>, delay: Duration) {
            self.delays.lock().unwrap().insert(category, delay);
        }

        pub fn calls(&self) -> Vec<(usize, Option<CategoryId>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl RaceDataSource for FakeRaceSource {
        fn fetch_next_races(
            &self,
            count: usize,
            category: Option<CategoryId>,
        ) -> BoxFuture<'static, Result<Vec<Race>, DataError>> {
            self.calls.lock().unwrap().push((count, category));
            let result = self
                .responses
                .lock()
                .unwrap()
                .get(&category)
                .cloned()
                .unwrap_or_else(|| Ok(Vec::new()));
            let delay = self.delays.lock().unwrap().get(&category).copied();
            Box::pin(async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                result
            })
        }
    }

    pub fn race(id: &str, category: CategoryId, start: i64) -> Race {
        Race {
            id: id.to_string(),
            name: format!("Race {}", id),
            number: 1,
            meeting_name: "Meeting".to_string(),
            category,
            advertised_start: chrono::DateTime::from_timestamp(start, 0).unwrap(),
        }
    }
}
