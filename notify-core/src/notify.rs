//! Push notification dispatch and weather message formatting.
//!
//! Provider failures never escape this service as errors: every path returns
//! a [`DispatchResult`] (or a batch of them) with the failure captured as a
//! value.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::model::{BatchDispatchResult, DispatchResult, PrecipitationType, WeatherSnapshot};
use crate::push::{PushMessage, PushProvider};

/// Precipitation probability at or above which the umbrella reminder is
/// appended.
const UMBRELLA_THRESHOLD: u8 = 30;

pub struct NotificationService {
    provider: Arc<dyn PushProvider>,
}

impl NotificationService {
    pub fn new(provider: Arc<dyn PushProvider>) -> Self {
        Self { provider }
    }

    /// Send one notification. A blank token short-circuits to a failure
    /// result without contacting the provider.
    pub async fn send_to_one(&self, token: &str, title: &str, body: &str) -> DispatchResult {
        self.dispatch(PushMessage::new(token, title, body)).await
    }

    /// Send the same notification to many tokens in one provider round trip.
    /// An empty token list returns zero counts without a provider call.
    pub async fn send_to_many(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
    ) -> BatchDispatchResult {
        if tokens.is_empty() {
            return BatchDispatchResult::default();
        }

        let messages: Vec<PushMessage> = tokens
            .iter()
            .map(|token| PushMessage::new(token.clone(), title, body))
            .collect();

        let responses = match self.provider.send_many(&messages).await {
            Ok(responses) => responses,
            Err(err) => {
                error!(error = %err, "push batch round trip failed");
                vec![DispatchResult::failed(err.to_string()); tokens.len()]
            }
        };

        let success_count = responses.iter().filter(|r| r.success).count();
        let failure_count = responses.len() - success_count;

        info!(
            total = tokens.len(),
            success_count, failure_count, "push batch sent"
        );
        if failure_count > 0 {
            warn!(success_count, failure_count, "some push sends failed");
        }

        BatchDispatchResult {
            success_count,
            failure_count,
            responses,
        }
    }

    /// Format a weather summary for `snapshot` and send it to `token`.
    pub async fn send_weather_notification(
        &self,
        token: &str,
        snapshot: &WeatherSnapshot,
    ) -> DispatchResult {
        let (title, body) = weather_message(snapshot);

        let data = HashMap::from([
            ("type".to_string(), "weather".to_string()),
            ("temperature".to_string(), snapshot.temperature.to_string()),
            (
                "sky_condition".to_string(),
                snapshot.sky_condition.label().to_string(),
            ),
        ]);

        self.dispatch(PushMessage::new(token, title, body).with_data(data))
            .await
    }

    async fn dispatch(&self, message: PushMessage) -> DispatchResult {
        if message.token.trim().is_empty() {
            return DispatchResult::failed("push token is required");
        }

        match self.provider.send_one(&message).await {
            Ok(message_id) => {
                info!(token = %message.token, message_id = %message_id, "notification sent");
                DispatchResult::ok(message_id)
            }
            Err(err) => {
                error!(token = %message.token, error = %err, "failed to send notification");
                DispatchResult::failed(err.to_string())
            }
        }
    }
}

/// Title and body for a weather notification.
fn weather_message(snapshot: &WeatherSnapshot) -> (String, String) {
    let title = "Today's weather".to_string();
    let mut body = format!(
        "Currently {}°C, {}.",
        snapshot.temperature,
        snapshot.sky_condition.label()
    );

    if snapshot.precipitation_type != PrecipitationType::None {
        body.push_str(&format!(" Expect {}.", snapshot.precipitation_type.label()));
    }

    if snapshot.precipitation_probability >= UMBRELLA_THRESHOLD {
        body.push_str(" Take an umbrella!");
    }

    (title, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PushError;
    use crate::model::SkyCondition;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            temperature: 21.5,
            humidity: 40,
            precipitation: 0.0,
            precipitation_probability: 0,
            wind_speed: 1.0,
            sky_condition: SkyCondition::Clear,
            precipitation_type: PrecipitationType::None,
            forecast_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            forecast_time: "0900".to_string(),
        }
    }

    #[derive(Debug, Default)]
    struct RecordingProvider {
        calls: AtomicUsize,
        fail_with: Option<String>,
        fail_batch: Option<String>,
    }

    #[async_trait]
    impl PushProvider for RecordingProvider {
        async fn send_one(&self, message: &PushMessage) -> Result<String, PushError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.fail_with {
                Some(err) => Err(PushError::Rejected(err.clone())),
                None => Ok(format!("mid-{}", message.token)),
            }
        }

        async fn send_many(
            &self,
            messages: &[PushMessage],
        ) -> Result<Vec<DispatchResult>, PushError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = &self.fail_batch {
                return Err(PushError::Status {
                    status: 503,
                    body: err.clone(),
                });
            }
            Ok(messages
                .iter()
                .map(|m| DispatchResult::ok(format!("mid-{}", m.token)))
                .collect())
        }
    }

    #[tokio::test]
    async fn blank_token_fails_without_a_provider_call() {
        let provider = Arc::new(RecordingProvider::default());
        let service = NotificationService::new(provider.clone());

        let result = service.send_to_one("   ", "t", "b").await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("push token is required"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_batch_returns_zero_counts_without_a_provider_call() {
        let provider = Arc::new(RecordingProvider::default());
        let service = NotificationService::new(provider.clone());

        let batch = service.send_to_many(&[], "t", "b").await;
        assert_eq!(batch.success_count, 0);
        assert_eq!(batch.failure_count, 0);
        assert!(batch.responses.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn batch_counts_match_responses() {
        let provider = Arc::new(RecordingProvider::default());
        let service = NotificationService::new(provider);

        let tokens = vec!["a".to_string(), "b".to_string()];
        let batch = service.send_to_many(&tokens, "t", "b").await;
        assert_eq!(batch.success_count, 2);
        assert_eq!(batch.failure_count, 0);
        assert_eq!(batch.responses.len(), 2);
        assert_eq!(batch.responses[0].message_id.as_deref(), Some("mid-a"));
    }

    #[tokio::test]
    async fn batch_round_trip_failure_fails_every_token() {
        let provider = Arc::new(RecordingProvider {
            fail_batch: Some("service unavailable".to_string()),
            ..RecordingProvider::default()
        });
        let service = NotificationService::new(provider);

        let tokens = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let batch = service.send_to_many(&tokens, "t", "b").await;
        assert_eq!(batch.success_count, 0);
        assert_eq!(batch.failure_count, 3);
        assert_eq!(batch.responses.len(), 3);
        for response in &batch.responses {
            assert!(!response.success);
            assert!(
                response
                    .error
                    .as_deref()
                    .unwrap()
                    .contains("service unavailable")
            );
        }
    }

    #[tokio::test]
    async fn provider_error_becomes_a_failure_result() {
        let provider = Arc::new(RecordingProvider {
            fail_with: Some("NotRegistered".to_string()),
            ..RecordingProvider::default()
        });
        let service = NotificationService::new(provider);

        let result = service.send_to_one("tok", "t", "b").await;
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("NotRegistered"));
    }

    #[test]
    fn clear_weather_message_has_no_precipitation_clause() {
        let (title, body) = weather_message(&snapshot());
        assert_eq!(title, "Today's weather");
        assert_eq!(body, "Currently 21.5°C, clear.");
    }

    #[test]
    fn precipitation_type_appends_a_clause() {
        let mut snap = snapshot();
        snap.precipitation_type = PrecipitationType::Rain;
        let (_, body) = weather_message(&snap);
        assert_eq!(body, "Currently 21.5°C, clear. Expect rain.");
    }

    #[test]
    fn high_probability_appends_umbrella_reminder() {
        let mut snap = snapshot();
        snap.precipitation_type = PrecipitationType::Shower;
        snap.precipitation_probability = 30;
        let (_, body) = weather_message(&snap);
        assert_eq!(body, "Currently 21.5°C, clear. Expect showers. Take an umbrella!");
    }

    #[test]
    fn probability_below_threshold_omits_umbrella_reminder() {
        let mut snap = snapshot();
        snap.precipitation_probability = 29;
        let (_, body) = weather_message(&snap);
        assert!(!body.contains("umbrella"));
    }

    #[tokio::test]
    async fn weather_notification_carries_payload_data() {
        let provider = Arc::new(RecordingProvider::default());
        let service = NotificationService::new(provider);

        let result = service.send_weather_notification("tok", &snapshot()).await;
        assert!(result.success);
        assert_eq!(result.message_id.as_deref(), Some("mid-tok"));
    }
}
