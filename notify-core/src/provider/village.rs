use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::WeatherError;
use crate::model::GridPoint;
use crate::provider::{ForecastItem, ForecastProvider};

/// Result code the service uses for a successful response.
const RESULT_OK: &str = "00";
/// Bounded timeout so a stuck upstream cannot stall a scheduler tick.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the short-term village forecast service.
///
/// The service issues a fresh dataset at minute 45 past each hour and is
/// queried by grid cell plus issuance slot.
#[derive(Debug, Clone)]
pub struct VillageForecastProvider {
    base_url: String,
    service_key: String,
    http: Client,
}

impl VillageForecastProvider {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.into(),
            service_key: service_key.into(),
            http,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    response: ResponseEnvelope,
}

#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    header: ResponseHeader,
    body: Option<ResponseBody>,
}

#[derive(Debug, Deserialize)]
struct ResponseHeader {
    #[serde(rename = "resultCode")]
    result_code: String,
    #[serde(rename = "resultMsg")]
    result_msg: String,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    items: ItemList,
}

#[derive(Debug, Deserialize)]
struct ItemList {
    item: Vec<ForecastItem>,
}

#[async_trait]
impl ForecastProvider for VillageForecastProvider {
    async fn fetch(
        &self,
        grid: GridPoint,
        base_date: &str,
        base_time: &str,
    ) -> Result<Vec<ForecastItem>, WeatherError> {
        let url = format!("{}/getUltraSrtFcst", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("serviceKey", self.service_key.as_str()),
                ("numOfRows", "60"),
                ("pageNo", "1"),
                ("dataType", "JSON"),
                ("base_date", base_date),
                ("base_time", base_time),
                ("nx", &grid.nx.to_string()),
                ("ny", &grid.ny.to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(WeatherError::Provider {
                code: status.as_u16().to_string(),
                message: truncate_body(&body),
            });
        }

        let parsed: ApiResponse =
            serde_json::from_str(&body).map_err(|err| WeatherError::Parse(err.to_string()))?;

        let header = parsed.response.header;
        if header.result_code != RESULT_OK {
            return Err(WeatherError::Provider {
                code: header.result_code,
                message: header.result_msg,
            });
        }

        let items = parsed
            .response
            .body
            .map(|b| b.items.item)
            .unwrap_or_default();
        if items.is_empty() {
            return Err(WeatherError::NoData);
        }

        debug!(nx = grid.nx, ny = grid.ny, count = items.len(), "forecast fetched");
        Ok(items)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        let cut: String = body.chars().take(MAX).collect();
        format!("{cut}...")
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn success_body() -> serde_json::Value {
        json!({
            "response": {
                "header": { "resultCode": "00", "resultMsg": "NORMAL_SERVICE" },
                "body": {
                    "dataType": "JSON",
                    "items": {
                        "item": [
                            {
                                "baseDate": "20240115", "baseTime": "0630",
                                "category": "T1H", "fcstDate": "20240115",
                                "fcstTime": "0700", "fcstValue": "-2.1",
                                "nx": 60, "ny": 127
                            },
                            {
                                "baseDate": "20240115", "baseTime": "0630",
                                "category": "SKY", "fcstDate": "20240115",
                                "fcstTime": "0700", "fcstValue": "3",
                                "nx": 60, "ny": 127
                            }
                        ]
                    },
                    "pageNo": 1, "numOfRows": 60, "totalCount": 2
                }
            }
        })
    }

    #[tokio::test]
    async fn fetch_parses_observation_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/getUltraSrtFcst"))
            .and(query_param("base_date", "20240115"))
            .and(query_param("base_time", "0600"))
            .and(query_param("nx", "60"))
            .and(query_param("ny", "127"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .mount(&server)
            .await;

        let provider = VillageForecastProvider::new(server.uri(), "KEY").unwrap();
        let items = provider
            .fetch(GridPoint { nx: 60, ny: 127 }, "20240115", "0600")
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].category, "T1H");
        assert_eq!(items[0].fcst_value, "-2.1");
        assert_eq!(items[1].category, "SKY");
    }

    #[tokio::test]
    async fn non_success_result_code_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": {
                    "header": { "resultCode": "30", "resultMsg": "SERVICE_KEY_IS_NOT_REGISTERED_ERROR" }
                }
            })))
            .mount(&server)
            .await;

        let provider = VillageForecastProvider::new(server.uri(), "BAD").unwrap();
        let err = provider
            .fetch(GridPoint { nx: 60, ny: 127 }, "20240115", "0600")
            .await
            .unwrap_err();

        match err {
            WeatherError::Provider { code, message } => {
                assert_eq!(code, "30");
                assert!(message.contains("SERVICE_KEY"));
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_item_list_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": {
                    "header": { "resultCode": "00", "resultMsg": "NORMAL_SERVICE" },
                    "body": { "items": { "item": [] }, "pageNo": 1, "numOfRows": 60, "totalCount": 0 }
                }
            })))
            .mount(&server)
            .await;

        let provider = VillageForecastProvider::new(server.uri(), "KEY").unwrap();
        let err = provider
            .fetch(GridPoint { nx: 60, ny: 127 }, "20240115", "0600")
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::NoData));
    }

    #[tokio::test]
    async fn http_error_status_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let provider = VillageForecastProvider::new(server.uri(), "KEY").unwrap();
        let err = provider
            .fetch(GridPoint { nx: 60, ny: 127 }, "20240115", "0600")
            .await
            .unwrap_err();

        match err {
            WeatherError::Provider { code, message } => {
                assert_eq!(code, "500");
                assert!(message.contains("upstream down"));
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn truncate_body_limits_long_payloads() {
        let long = "x".repeat(500);
        let cut = truncate_body(&long);
        assert!(cut.ends_with("..."));
        assert!(cut.chars().count() <= 203);
    }
}
