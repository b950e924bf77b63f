use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Discrete cell index in the forecast provider's mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPoint {
    pub nx: i64,
    pub ny: i64,
}

/// Sky state reported by the forecast service, mapped from its numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkyCondition {
    Clear,
    MostlyCloudy,
    Overcast,
    Unknown,
}

impl SkyCondition {
    /// Map the provider's SKY category value. Unrecognized codes are reported
    /// as `Unknown` rather than failing the fetch.
    pub fn from_code(code: &str) -> Self {
        match code {
            "1" => Self::Clear,
            "3" => Self::MostlyCloudy,
            "4" => Self::Overcast,
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::MostlyCloudy => "mostly cloudy",
            Self::Overcast => "overcast",
            Self::Unknown => "unknown",
        }
    }
}

/// Precipitation form, mapped from the provider's PTY category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrecipitationType {
    None,
    Rain,
    RainSnow,
    Snow,
    Shower,
}

impl PrecipitationType {
    /// Unrecognized codes collapse to `None`, same as an absent category.
    pub fn from_code(code: &str) -> Self {
        match code {
            "1" => Self::Rain,
            "2" => Self::RainSnow,
            "3" => Self::Snow,
            "4" => Self::Shower,
            _ => Self::None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Rain => "rain",
            Self::RainSnow => "rain and snow",
            Self::Snow => "snow",
            Self::Shower => "showers",
        }
    }
}

/// One fully parsed forecast observation for a coordinate.
///
/// Snapshots round-trip through the cache without field loss: every field is
/// serialized, and a cached copy is returned verbatim within its TTL window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Air temperature in °C.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: u8,
    /// One-hour precipitation amount in mm.
    pub precipitation: f64,
    /// Probability of precipitation in percent; 0 when the product omits it.
    pub precipitation_probability: u8,
    /// Wind speed in m/s.
    pub wind_speed: f64,
    pub sky_condition: SkyCondition,
    pub precipitation_type: PrecipitationType,
    pub forecast_date: NaiveDate,
    /// Forecast time as the provider's raw "HHMM" string.
    pub forecast_time: String,
}

/// Per-user notification settings, read from the user store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    pub notification_enabled: bool,
    /// Scheduled delivery time, "HH:MM:SS".
    pub notification_time: String,
    pub fcm_token: Option<String>,
    pub location_latitude: Option<f64>,
    pub location_longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub settings: Option<UserSettings>,
}

/// Outcome of a single push send. Failures are values, never errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl DispatchResult {
    pub fn ok(message_id: impl Into<String>) -> Self {
        Self {
            success: true,
            message_id: Some(message_id.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// Aggregated outcome of a batch send; `responses` is positionally aligned
/// with the input token sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchDispatchResult {
    pub success_count: usize,
    pub failure_count: usize,
    pub responses: Vec<DispatchResult>,
}

/// Tally of one scheduler tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}
