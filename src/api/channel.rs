use serde::{Deserialize, Serialize};

pub const DEFAULT_CHANNEL_BASE: &str = "https://jp-gw.spooncast.net";

/// Live and schedule details from the channel endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub current_live_id: Option<u64>,
    pub recent_live: Option<RecentLive>,
    pub schedules: Vec<Schedule>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentLive {
    pub created: String,
    pub title: String,
    pub img_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub schedule_date: String,
    pub title: String,
}

impl ChannelInfo {
    pub fn live_url(&self) -> Option<String> {
        self.current_live_id
            .map(|id| format!("https://www.spooncast.net/jp/live/{}", id))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChannelEnvelope {
    #[serde(default)]
    result: Option<ChannelResult>,
}

#[derive(Debug, Deserialize)]
struct ChannelResult {
    #[serde(default)]
    channel: Option<WireChannel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireChannel {
    #[serde(default)]
    current_live_id: Option<u64>,
    #[serde(default)]
    recent_live_casts: Option<Vec<WireCast>>,
    #[serde(default)]
    schedules: Option<Vec<WireSchedule>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCast {
    #[serde(default)]
    created: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    img_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSchedule {
    #[serde(default)]
    schedule_date: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl ChannelEnvelope {
    /// `None` when the response carries no channel object.
    pub(crate) fn into_info(self) -> Option<ChannelInfo> {
        let channel = self.result?.channel?;

        let recent_live = channel
            .recent_live_casts
            .and_then(|casts| casts.into_iter().next())
            .map(|cast| RecentLive {
                created: cast.created.unwrap_or_default(),
                title: cast.title.unwrap_or_default(),
                img_url: cast.img_url,
            });

        let schedules = channel
            .schedules
            .unwrap_or_default()
            .into_iter()
            .filter_map(|s| {
                Some(Schedule {
                    schedule_date: s.schedule_date?,
                    title: s.title.unwrap_or_default(),
                })
            })
            .collect();

        Some(ChannelInfo {
            current_live_id: channel.current_live_id,
            recent_live,
            schedules,
        })
    }
}
