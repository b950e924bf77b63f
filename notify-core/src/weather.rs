//! Cache-aside weather acquisition.
//!
//! Read path: deterministic key from the raw coordinates → cache lookup →
//! on miss, grid projection + issuance-slot computation + provider fetch →
//! parse → write-through with a fixed TTL. A cache write failure is logged
//! and swallowed; the freshly fetched snapshot is still returned.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::cache::{Cache, generate_key};
use crate::error::WeatherError;
use crate::grid;
use crate::model::{PrecipitationType, SkyCondition, WeatherSnapshot};
use crate::provider::{ForecastItem, ForecastProvider};

/// How long a fetched snapshot stays valid in the cache.
pub const WEATHER_CACHE_TTL_SECS: u64 = 300;

/// Minute past the hour at which the provider publishes a new dataset.
const ISSUE_MINUTE: u32 = 45;

pub struct WeatherService {
    cache: Cache,
    provider: Box<dyn ForecastProvider>,
    zone: FixedOffset,
}

impl WeatherService {
    pub fn new(cache: Cache, provider: Box<dyn ForecastProvider>, zone: FixedOffset) -> Self {
        Self {
            cache,
            provider,
            zone,
        }
    }

    /// Fetch the current weather snapshot for a coordinate.
    ///
    /// Within the TTL window, repeated calls for the same coordinate are
    /// served from the cache and never reach the provider.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError`] when the provider answers with a failure
    /// code, with no observations, with mandatory categories missing, or
    /// when the cache read path fails.
    pub async fn get_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let key = generate_key(
            "weather",
            &[("lat", json!(latitude)), ("lon", json!(longitude))],
        );

        if let Some(snapshot) = self.cache.get::<WeatherSnapshot>(&key).await? {
            info!(latitude, longitude, key = %key, "weather served from cache");
            return Ok(snapshot);
        }

        let grid = grid::to_grid(latitude, longitude);
        let now = Utc::now().with_timezone(&self.zone);
        let (base_date, base_time) = base_date_time(now);

        info!(
            latitude,
            longitude,
            nx = grid.nx,
            ny = grid.ny,
            base_date = %base_date,
            base_time = %base_time,
            "fetching weather from provider"
        );

        let items = self.provider.fetch(grid, &base_date, &base_time).await?;
        let snapshot = parse_snapshot(&items)?;

        if let Err(err) = self
            .cache
            .set(&key, &snapshot, WEATHER_CACHE_TTL_SECS)
            .await
        {
            warn!(key = %key, error = %err, "weather cache write failed");
        }

        Ok(snapshot)
    }
}

/// Most recent issuance slot strictly usable at `now`.
///
/// The provider publishes at minute 45 past each hour; before that minute,
/// the previous hour's dataset is the newest one available. Hour subtraction
/// goes through chrono, so day, month and year rollover all fall out.
pub fn base_date_time(now: DateTime<FixedOffset>) -> (String, String) {
    let base = if now.minute() < ISSUE_MINUTE {
        now - chrono::Duration::hours(1)
    } else {
        now
    };

    let base_date = format!("{:04}{:02}{:02}", base.year(), base.month(), base.day());
    let base_time = format!("{:02}00", base.hour());
    (base_date, base_time)
}

/// Fold the flat observation list into a snapshot.
///
/// Temperature (T1H) and sky condition (SKY) are mandatory; the remaining
/// numeric categories default to zero when absent or unparseable, since the
/// provider omits them for some grid cells.
fn parse_snapshot(items: &[ForecastItem]) -> Result<WeatherSnapshot, WeatherError> {
    let first = items.first().ok_or(WeatherError::NoData)?;

    let mut by_category: HashMap<&str, &str> = HashMap::new();
    for item in items {
        by_category.insert(item.category.as_str(), item.fcst_value.as_str());
    }

    let temperature = *by_category
        .get("T1H")
        .ok_or(WeatherError::MissingData("T1H"))?;
    let sky = *by_category
        .get("SKY")
        .ok_or(WeatherError::MissingData("SKY"))?;

    let forecast_date = NaiveDate::parse_from_str(&first.fcst_date, "%Y%m%d")
        .map_err(|err| WeatherError::Parse(format!("bad forecast date {}: {err}", first.fcst_date)))?;

    Ok(WeatherSnapshot {
        temperature: temperature.parse().unwrap_or(0.0),
        humidity: by_category
            .get("REH")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        precipitation: by_category
            .get("RN1")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0),
        // The ultra-short product carries no probability of precipitation.
        precipitation_probability: 0,
        wind_speed: by_category
            .get("WSD")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0),
        sky_condition: SkyCondition::from_code(sky),
        precipitation_type: PrecipitationType::from_code(by_category.get("PTY").copied().unwrap_or("0")),
        forecast_date,
        forecast_time: first.fcst_time.clone(),
    })
}
