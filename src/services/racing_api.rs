//! Racing API client ("next races" endpoint).
//!
//! `GET {base}/rest/v1/racing/?method=nextraces&count=N[&category_ids=["<id>"]]`
//! returns race summaries keyed by race id plus the `next_to_go_ids` ordering.

use chrono::DateTime;
use futures::future::BoxFuture;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::domain::models::{CategoryId, Race};
use crate::errors::DataError;

const NEXT_RACES_PATH: &str = "/rest/v1/racing/";
const NEXT_RACES_METHOD: &str = "nextraces";

/// Something that can fetch the next races, optionally scoped to one category.
pub trait RaceDataSource: Send + Sync {
    fn fetch_next_races(
        &self,
        count: usize,
        category: Option<CategoryId>,
    ) -> BoxFuture<'static, Result<Vec<Race>, DataError>>;
}

/// HTTP client for the racing API.
#[derive(Debug, Clone)]
pub struct RacingApiClient {
    client: reqwest::Client,
    base_url: String,
}

// --- Racing API JSON response types ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    data: RacingData,
}

#[derive(Debug, Deserialize)]
struct RacingData {
    #[serde(default)]
    next_to_go_ids: Vec<String>,
    #[serde(default)]
    race_summaries: HashMap<String, RaceDto>,
}

#[derive(Debug, Deserialize)]
struct RaceDto {
    race_id: String,
    race_name: String,
    race_number: u32,
    meeting_name: String,
    category_id: String,
    advertised_start: AdvertisedStartDto,
}

#[derive(Debug, Deserialize)]
struct AdvertisedStartDto {
    seconds: i64,
}

impl RaceDto {
    /// Convert to a domain race. Unknown categories (and out-of-range start
    /// times) are dropped rather than treated as errors.
    fn into_race(self) -> Option<Race> {
        let category = match CategoryId::from_external_id(&self.category_id) {
            Some(c) => c,
            None => {
                tracing::debug!(
                    "Dropping race {} with unknown category {}",
                    self.race_id,
                    self.category_id
                );
                return None;
            }
        };
        let advertised_start = DateTime::from_timestamp(self.advertised_start.seconds, 0)?;

        Some(Race {
            id: self.race_id,
            name: self.race_name,
            number: self.race_number,
            meeting_name: self.meeting_name,
            category,
            advertised_start,
        })
    }
}

impl RacingApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch up to `count` upcoming races.
    pub async fn next_races(
        &self,
        count: usize,
        category: Option<CategoryId>,
    ) -> Result<Vec<Race>, DataError> {
        let url = format!("{}{}", self.base_url, NEXT_RACES_PATH);

        let mut query = vec![
            ("method", NEXT_RACES_METHOD.to_string()),
            ("count", count.to_string()),
        ];
        if let Some(category) = category {
            query.push((
                "category_ids",
                serde_json::to_string(&[category.external_id()])?,
            ));
        }

        let response = self
            .client
            .get(&url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!("Racing API returned HTTP {}", response.status());
            return Err(DataError::from_status(response.status()));
        }

        let body = response.bytes().await?;
        let races = decode_races(&body)?;

        tracing::debug!(
            "Racing API: {} races (count={}, category={:?})",
            races.len(),
            count,
            category
        );
        Ok(races)
    }
}

impl RaceDataSource for RacingApiClient {
    fn fetch_next_races(
        &self,
        count: usize,
        category: Option<CategoryId>,
    ) -> BoxFuture<'static, Result<Vec<Race>, DataError>> {
        let client = self.clone();
        Box::pin(async move { client.next_races(count, category).await })
    }
}

/// Decode a "next races" body into races in `next_to_go_ids` order.
///
/// Summaries missing from `next_to_go_ids` are appended sorted by id so the
/// output never depends on map iteration order.
fn decode_races(body: &[u8]) -> Result<Vec<Race>, DataError> {
    let response: ApiResponse = serde_json::from_slice(body)?;
    let mut summaries = response.data.race_summaries;

    let mut ordered = Vec::with_capacity(summaries.len());
    for id in &response.data.next_to_go_ids {
        if let Some(dto) = summaries.remove(id) {
            ordered.push(dto);
        }
    }
    let mut rest: Vec<RaceDto> = summaries.into_values().collect();
    rest.sort_by(|a, b| a.race_id.cmp(&b.race_id));
    ordered.extend(rest);

    Ok(ordered.into_iter().filter_map(RaceDto::into_race).collect())
}
