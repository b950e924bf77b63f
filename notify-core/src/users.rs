use async_trait::async_trait;

use crate::model::UserRecord;

/// Read-only boundary to the user store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// All users, each with their notification settings when present.
    async fn find_all(&self) -> anyhow::Result<Vec<UserRecord>>;
}

/// User store backed by the records listed in the configuration file.
#[derive(Debug, Default)]
pub struct StaticUserStore {
    users: Vec<UserRecord>,
}

impl StaticUserStore {
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserStore for StaticUserStore {
    async fn find_all(&self) -> anyhow::Result<Vec<UserRecord>> {
        Ok(self.users.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserSettings;

    #[tokio::test]
    async fn static_store_returns_configured_users() {
        let store = StaticUserStore::new(vec![UserRecord {
            id: "u1".to_string(),
            settings: Some(UserSettings {
                notification_enabled: true,
                notification_time: "07:30:00".to_string(),
                fcm_token: Some("tok".to_string()),
                location_latitude: Some(37.5665),
                location_longitude: Some(126.978),
            }),
        }]);

        let users = store.find_all().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, "u1");
    }

    #[tokio::test]
    async fn empty_store_returns_no_users() {
        let store = StaticUserStore::default();
        assert!(store.find_all().await.unwrap().is_empty());
    }
}
