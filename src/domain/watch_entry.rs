use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RewardId;

/// One chat's subscription to one tracked reward.
///
/// `last_notified`, when set, is >= the most recent `available_since`; a fresh
/// notification goes out only while `last_notified` is absent or strictly older
/// than `available_since`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WatchEntry {
    /// Storage-assigned key.
    pub id: i64,
    pub chat_id: i64,
    pub reward_id: RewardId,
    /// First observation of the current availability window; cleared when the
    /// reward runs out of slots again.
    pub available_since: Option<DateTime<Utc>>,
    /// Set right after a notification for the current window went out.
    pub last_notified: Option<DateTime<Utc>>,
    /// True once a fetch classified the reward as not-found or forbidden.
    pub is_missing: bool,
}

impl WatchEntry {
    /// Whether the current availability window still needs a notification.
    pub fn needs_notification(&self) -> bool {
        match (self.available_since, self.last_notified) {
            (Some(_), None) => true,
            (Some(since), Some(notified)) => since > notified,
            (None, _) => false,
        }
    }
}
