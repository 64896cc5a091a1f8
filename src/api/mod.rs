pub mod channel;
pub mod client;
pub mod paginate;
pub mod source;

pub use channel::{ChannelInfo, RecentLive, Schedule};
pub use client::{FollowData, FollowSnapshot, SpoonClient};
pub use paginate::{Aggregated, PageStats, Paginator, Termination};
pub use source::{HttpSource, JsonSource, ProxyRewrite};

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://jp-api.spooncast.net";

/// A followable account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub id: u64,
    pub nickname: String,
    pub tag: String,
    pub profile_url: Option<String>,
    pub follower_count: u64,
    pub following_count: u64,
    pub is_live: Option<bool>,
    pub last_live_at: Option<String>,
    pub description: String,
    pub date_joined: Option<String>,
    pub is_verified: bool,
}

/// The user at the middle of the graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CenterUser {
    pub id: String,
    pub nickname: String,
    pub tag: String,
    pub profile_url: Option<String>,
}

impl CenterUser {
    /// Stand-in used when the profile endpoint returns no result.
    pub fn placeholder(id: u64) -> Self {
        Self {
            id: id.to_string(),
            nickname: format!("User {}", id),
            tag: format!("user_{}", id),
            profile_url: None,
        }
    }
}

impl From<&Entity> for CenterUser {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id.to_string(),
            nickname: entity.nickname.clone(),
            tag: entity.tag.clone(),
            profile_url: entity.profile_url.clone(),
        }
    }
}

/// Account record as the API sends it. Only `id` is mandatory; everything
/// else is normalized when converting into [`Entity`].
#[derive(Debug, Deserialize)]
struct ApiUser {
    id: u64,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    profile_url: Option<String>,
    #[serde(default)]
    follower_count: Option<u64>,
    #[serde(default)]
    following_count: Option<u64>,
    #[serde(default)]
    is_live: Option<bool>,
    #[serde(default)]
    current_live: Option<serde_json::Value>,
    #[serde(default)]
    last_live_at: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    date_joined: Option<String>,
    #[serde(default)]
    is_verified: Option<bool>,
}

impl From<ApiUser> for Entity {
    fn from(u: ApiUser) -> Self {
        let is_live = u
            .is_live
            .or_else(|| u.current_live.as_ref().map(|live| !live.is_null()));
        let tag = u.tag.unwrap_or_default();

        Entity {
            id: u.id,
            nickname: u.nickname.unwrap_or_default(),
            tag: tag.trim_start_matches('@').to_string(),
            profile_url: u.profile_url.filter(|url| !url.trim().is_empty()),
            follower_count: u.follower_count.unwrap_or(0),
            following_count: u.following_count.unwrap_or(0),
            is_live,
            last_live_at: u.last_live_at,
            description: u.description.unwrap_or_default(),
            date_joined: u.date_joined,
            is_verified: u.is_verified.unwrap_or(false),
        }
    }
}

impl<'de> Deserialize<'de> for Entity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        ApiUser::deserialize(deserializer).map(Entity::from)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{Entity, JsonSource};
    use crate::error::FetchError;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory API: canned JSON per URL, canned HTTP failures, optional latency.
    #[derive(Default)]
    pub struct MockSource {
        pages: HashMap<String, Value>,
        statuses: HashMap<String, u16>,
        delay: Option<Duration>,
        calls: Mutex<Vec<String>>,
    }

    impl MockSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_page(mut self, url: &str, body: Value) -> Self {
            self.pages.insert(url.to_string(), body);
            self
        }

        pub fn with_status(mut self, url: &str, status: u16) -> Self {
            self.statuses.insert(url.to_string(), status);
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JsonSource for MockSource {
        async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(status) = self.statuses.get(url) {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: *status,
                });
            }
            self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    pub fn entity_json(id: u64) -> Value {
        json!({
            "id": id,
            "nickname": format!("user{}", id),
            "tag": format!("tag{}", id),
            "follower_count": id * 10,
            "following_count": id,
        })
    }

    pub fn list_page(ids: &[u64], next: Option<&str>) -> Value {
        json!({
            "status_code": 200,
            "detail": "Success",
            "next": next,
            "previous": null,
            "results": ids.iter().map(|id| entity_json(*id)).collect::<Vec<_>>(),
        })
    }

    pub fn entity(id: u64) -> Entity {
        Entity {
            id,
            nickname: format!("user{}", id),
            tag: format!("tag{}", id),
            profile_url: None,
            follower_count: id * 10,
            following_count: id,
            is_live: None,
            last_live_at: None,
            description: String::new(),
            date_joined: None,
            is_verified: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_from_api_json() {
        let value = json!({
            "id": 316165978,
            "nickname": "fumiya",
            "tag": "mr.forte",
            "top_impressions": [],
            "profile_url": "http://cdn.example/p.jpg",
            "follower_count": 6,
            "following_count": 8,
            "current_live": null,
            "date_joined": "2024-01-30T13:11:25.659291Z",
            "is_verified": false
        });
        let entity: Entity = serde_json::from_value(value).unwrap();
        assert_eq!(entity.id, 316165978);
        assert_eq!(entity.tag, "mr.forte");
        assert_eq!(entity.follower_count, 6);
        assert_eq!(entity.is_live, None);
        assert_eq!(
            entity.date_joined.as_deref(),
            Some("2024-01-30T13:11:25.659291Z")
        );
    }

    #[test]
    fn test_entity_live_from_current_live() {
        let value = json!({ "id": 1, "current_live": { "id": 99 } });
        let entity: Entity = serde_json::from_value(value).unwrap();
        assert_eq!(entity.is_live, Some(true));
        assert_eq!(entity.nickname, "");
    }

    #[test]
    fn test_entity_explicit_live_flag_wins() {
        let value = json!({ "id": 1, "is_live": false, "current_live": { "id": 99 } });
        let entity: Entity = serde_json::from_value(value).unwrap();
        assert_eq!(entity.is_live, Some(false));
    }

    #[test]
    fn test_entity_normalizes_tag_and_blank_avatar() {
        let value = json!({ "id": 2, "tag": "@someone", "profile_url": "  " });
        let entity: Entity = serde_json::from_value(value).unwrap();
        assert_eq!(entity.tag, "someone");
        assert!(entity.profile_url.is_none());
    }

    #[test]
    fn test_entity_without_id_rejected() {
        let value = json!({ "nickname": "ghost" });
        assert!(serde_json::from_value::<Entity>(value).is_err());
        let value = json!({ "id": "not-a-number" });
        assert!(serde_json::from_value::<Entity>(value).is_err());
    }

    #[test]
    fn test_center_user_placeholder() {
        let center = CenterUser::placeholder(123);
        assert_eq!(center.id, "123");
        assert_eq!(center.tag, "user_123");
        assert!(center.profile_url.is_none());
    }
}
