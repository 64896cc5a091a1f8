use super::channel::{ChannelEnvelope, ChannelInfo, DEFAULT_CHANNEL_BASE};
use super::paginate::{null_as_empty, Aggregated, PageStats, Paginator, Termination};
use super::source::{HttpSource, JsonSource, ProxyRewrite};
use super::{CenterUser, Entity, DEFAULT_API_BASE};
use crate::config::ApiConfig;
use crate::error::FetchError;
use crate::graph::FollowGraph;
use crate::query::UserQuery;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything one query produces, ready for the table and the layout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowSnapshot {
    pub user_id: u64,
    pub center: CenterUser,
    pub profile: Option<Entity>,
    pub channel: Option<ChannelInfo>,
    #[serde(flatten)]
    pub graph: FollowGraph,
    pub pages: PagesSummary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PagesSummary {
    pub followers: PageStats,
    pub followings: PageStats,
}

#[derive(Debug, Deserialize)]
struct ProfileEnvelope {
    #[serde(default, deserialize_with = "null_as_empty")]
    results: Vec<Entity>,
}

#[derive(Debug, Deserialize)]
struct HandleEnvelope {
    #[serde(default)]
    status_code: Option<u16>,
    #[serde(default)]
    results: Option<Vec<HandleRef>>,
}

#[derive(Debug, Deserialize)]
struct HandleRef {
    #[serde(default)]
    user_id: Option<u64>,
}

/// Read-only client for the follow-data API.
pub struct SpoonClient {
    source: Arc<dyn JsonSource>,
    base_url: String,
    channel_base: String,
    proxy: ProxyRewrite,
    termination: Termination,
    timeout: Duration,
}

impl SpoonClient {
    pub fn new(source: Arc<dyn JsonSource>, base_url: impl Into<String>) -> Self {
        Self {
            source,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            channel_base: DEFAULT_CHANNEL_BASE.to_string(),
            proxy: ProxyRewrite::direct(),
            termination: Termination::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        let base_url = if config.base_url.trim().is_empty() {
            DEFAULT_API_BASE.to_string()
        } else {
            config.base_url.clone()
        };

        Self::new(Arc::new(HttpSource::new()), base_url)
            .with_channel_base(&config.channel_base_url)
            .with_proxy(ProxyRewrite::new(config.proxy.clone()))
            .with_termination(config.pagination.termination())
            .with_timeout(Duration::from_secs(config.timeout_secs.max(1)))
    }

    /// Blank keeps the default channel host.
    pub fn with_channel_base(mut self, channel_base: &str) -> Self {
        let channel_base = channel_base.trim().trim_end_matches('/');
        if !channel_base.is_empty() {
            self.channel_base = channel_base.to_string();
        }
        self
    }

    pub fn with_proxy(mut self, proxy: ProxyRewrite) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_termination(mut self, termination: Termination) -> Self {
        self.termination = termination;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Turn a handle into a numeric user id. Numeric queries pass through.
    pub async fn resolve(&self, query: &UserQuery) -> Result<u64, FetchError> {
        let handle = match query {
            UserQuery::Id(id) => return Ok(*id),
            UserQuery::Handle(handle) => handle,
        };

        let target = format!(
            "{}/profiles/{}/",
            self.base_url,
            urlencoding::encode(handle)
        );
        let url = self.proxy.apply(&target);
        let unresolved = || FetchError::Unresolved {
            handle: handle.clone(),
        };

        let value = match self.source.get_json(&url).await {
            Ok(value) => value,
            Err(FetchError::Status { status: 404, .. }) => return Err(unresolved()),
            Err(e) => return Err(e),
        };
        let envelope: HandleEnvelope = serde_json::from_value(value).map_err(|_| unresolved())?;

        if envelope.status_code != Some(200) {
            return Err(unresolved());
        }
        let user_id = envelope
            .results
            .and_then(|results| results.into_iter().next())
            .and_then(|r| r.user_id)
            .ok_or_else(unresolved)?;

        debug!(handle = %handle, user_id, "resolved handle");
        Ok(user_id)
    }

    /// Profile, channel, followers and followings for one user, requested
    /// concurrently. The first failure fails the whole call and drops the
    /// other requests. The channel never fails the call.
    pub async fn fetch_follow_data(&self, user_id: u64) -> Result<FollowData, FetchError> {
        let paginator = Paginator::new(self.source.as_ref(), &self.proxy, self.termination);
        let followers_url = format!("{}/users/{}/followers/", self.base_url, user_id);
        let followings_url = format!("{}/users/{}/followings/", self.base_url, user_id);

        let (profile, channel, followers, followings) = futures::try_join!(
            self.fetch_profile(user_id),
            async { Ok::<_, FetchError>(self.fetch_channel(user_id).await) },
            paginator.fetch(&followers_url),
            paginator.fetch(&followings_url),
        )?;

        Ok(FollowData {
            profile,
            channel,
            followers,
            followings,
        })
    }

    async fn fetch_profile(&self, user_id: u64) -> Result<Option<Entity>, FetchError> {
        let url = self
            .proxy
            .apply(&format!("{}/users/{}/", self.base_url, user_id));
        let value = self.source.get_json(&url).await?;
        let envelope: ProfileEnvelope =
            serde_json::from_value(value).map_err(|source| FetchError::Decode {
                url: url.clone(),
                source,
            })?;
        Ok(envelope.results.into_iter().next())
    }

    /// Best effort: any failure is logged and yields `None`.
    async fn fetch_channel(&self, user_id: u64) -> Option<ChannelInfo> {
        let url = self
            .proxy
            .apply(&format!("{}/channels/{}", self.channel_base, user_id));
        let value = match self.source.get_json(&url).await {
            Ok(value) => value,
            Err(e) => {
                warn!(user_id, error = %e, "channel info unavailable");
                return None;
            }
        };
        match serde_json::from_value::<ChannelEnvelope>(value) {
            Ok(envelope) => envelope.into_info(),
            Err(e) => {
                warn!(user_id, error = %e, "channel info malformed");
                None
            }
        }
    }

    /// Resolve `query` and fetch its follow graph under a single deadline.
    pub async fn load(&self, query: &UserQuery) -> Result<FollowSnapshot, FetchError> {
        let work = async {
            let user_id = self.resolve(query).await?;
            let data = self.fetch_follow_data(user_id).await?;
            Ok::<_, FetchError>(build_snapshot(user_id, data))
        };

        let snapshot = tokio::time::timeout(self.timeout, work)
            .await
            .map_err(|_| FetchError::TimedOut(self.timeout))??;

        info!(
            user_id = snapshot.user_id,
            followers = snapshot.graph.followers.len(),
            followings = snapshot.graph.followings.len(),
            mutual = snapshot.graph.mutual_follows.len(),
            "loaded follow graph"
        );
        Ok(snapshot)
    }
}

/// Raw results of the concurrent fetch for one user.
#[derive(Debug)]
pub struct FollowData {
    pub profile: Option<Entity>,
    pub channel: Option<ChannelInfo>,
    pub followers: Aggregated,
    pub followings: Aggregated,
}

fn build_snapshot(user_id: u64, data: FollowData) -> FollowSnapshot {
    let FollowData {
        profile,
        channel,
        followers,
        followings,
    } = data;
    let center = profile
        .as_ref()
        .map(CenterUser::from)
        .unwrap_or_else(|| CenterUser::placeholder(user_id));
    let pages = PagesSummary {
        followers: followers.stats(),
        followings: followings.stats(),
    };

    FollowSnapshot {
        user_id,
        center,
        profile,
        channel,
        graph: FollowGraph::new(followers.results, followings.results),
        pages,
    }
}
