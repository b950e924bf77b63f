use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PushError;
use crate::model::DispatchResult;
use crate::push::{PushMessage, PushProvider};

pub const DEFAULT_ENDPOINT: &str = "https://fcm.googleapis.com/fcm/send";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// FCM HTTP client.
///
/// Single sends address one token via `to`; batches go out as one request
/// with `registration_ids`, and the response carries positionally aligned
/// per-recipient outcomes. `priority: "high"` requests high-priority
/// delivery on both mobile platforms' transports.
#[derive(Debug, Clone)]
pub struct FcmClient {
    endpoint: String,
    server_key: String,
    http: Client,
}

impl FcmClient {
    pub fn new(endpoint: impl Into<String>, server_key: impl Into<String>) -> Result<Self, PushError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            server_key: server_key.into(),
            http,
        })
    }

    async fn post(&self, request: &SendRequest<'_>) -> Result<SendResponse, PushError> {
        let res = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("key={}", self.server_key))
            .json(request)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(PushError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|err| PushError::Parse(err.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    registration_ids: Option<Vec<&'a str>>,
    notification: Notification<'a>,
    priority: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a HashMap<String, String>>,
}

#[derive(Debug, Serialize)]
struct Notification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    success: u64,
    failure: u64,
    results: Vec<SendOutcome>,
}

#[derive(Debug, Deserialize)]
struct SendOutcome {
    message_id: Option<String>,
    error: Option<String>,
}

impl SendOutcome {
    fn into_result(self) -> DispatchResult {
        match (self.message_id, self.error) {
            (Some(id), None) => DispatchResult::ok(id),
            (_, Some(err)) => DispatchResult::failed(err),
            (None, None) => DispatchResult::failed("missing outcome in push response"),
        }
    }
}

fn single_request<'a>(message: &'a PushMessage) -> SendRequest<'a> {
    SendRequest {
        to: Some(&message.token),
        registration_ids: None,
        notification: Notification {
            title: &message.title,
            body: &message.body,
        },
        priority: "high",
        data: message.data.as_ref(),
    }
}

#[async_trait]
impl PushProvider for FcmClient {
    async fn send_one(&self, message: &PushMessage) -> Result<String, PushError> {
        let response = self.post(&single_request(message)).await?;

        let outcome = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| PushError::Parse("empty results in push response".to_string()))?;

        match outcome.into_result() {
            DispatchResult {
                message_id: Some(id),
                success: true,
                ..
            } => Ok(id),
            result => Err(PushError::Rejected(
                result.error.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }

    async fn send_many(&self, messages: &[PushMessage]) -> Result<Vec<DispatchResult>, PushError> {
        // The multicast form takes one payload with many recipients; the
        // first message supplies the shared title/body/data.
        let first = match messages.first() {
            Some(m) => m,
            None => return Ok(Vec::new()),
        };

        let tokens: Vec<&str> = messages.iter().map(|m| m.token.as_str()).collect();
        let request = SendRequest {
            to: None,
            registration_ids: Some(tokens),
            notification: Notification {
                title: &first.title,
                body: &first.body,
            },
            priority: "high",
            data: first.data.as_ref(),
        };

        let response = self.post(&request).await?;
        debug!(
            success = response.success,
            failure = response.failure,
            "push batch completed"
        );

        Ok(response
            .results
            .into_iter()
            .map(SendOutcome::into_result)
            .collect())
    }
}
