use crate::api::FollowSnapshot;
use crate::error::FetchError;

/// Result of one background load, tagged with the request that started it so
/// the app can drop answers to queries the user has already replaced.
#[derive(Debug)]
pub struct FetchMessage {
    pub request_id: u64,
    pub outcome: Result<FollowSnapshot, FetchError>,
}
