use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::PushError;
use crate::model::DispatchResult;

pub mod fcm;

/// One push notification addressed to a device token.
#[derive(Debug, Clone)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
    /// Optional key-value payload delivered alongside the notification.
    pub data: Option<HashMap<String, String>>,
}

impl PushMessage {
    pub fn new(token: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            title: title.into(),
            body: body.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: HashMap<String, String>) -> Self {
        self.data = Some(data);
        self
    }
}

/// Boundary to the external push service.
///
/// `send_many` makes one round trip for the whole batch; its outcomes come
/// back positionally aligned with the input messages. Errors returned here
/// are captured by the notification service and turned into failure results.
#[async_trait]
pub trait PushProvider: Send + Sync + Debug {
    /// Send one message; returns the provider-assigned message id.
    async fn send_one(&self, message: &PushMessage) -> Result<String, PushError>;

    /// Send a batch in a single round trip. An `Err` means the round trip
    /// itself failed; per-recipient rejections come back as failure entries.
    async fn send_many(&self, messages: &[PushMessage]) -> Result<Vec<DispatchResult>, PushError>;
}
