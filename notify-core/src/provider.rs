use std::fmt::Debug;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::WeatherError;
use crate::model::GridPoint;

pub mod village;

/// One raw forecast observation as the provider reports it: a category code
/// and its value, tagged with the forecast date/time and grid cell.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastItem {
    pub category: String,
    #[serde(rename = "fcstDate")]
    pub fcst_date: String,
    #[serde(rename = "fcstTime")]
    pub fcst_time: String,
    #[serde(rename = "fcstValue")]
    pub fcst_value: String,
    pub nx: i64,
    pub ny: i64,
}

/// Boundary to the external forecast service.
///
/// `base_date` is "YYYYMMDD" and `base_time` "HHMM", the issuance slot of the
/// dataset being requested (not the times it predicts for).
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch(
        &self,
        grid: GridPoint,
        base_date: &str,
        base_time: &str,
    ) -> Result<Vec<ForecastItem>, WeatherError>;
}
