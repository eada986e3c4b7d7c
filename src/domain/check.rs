use serde::{Deserialize, Serialize};

use super::patreon::{CampaignData, RewardData};
use super::{FetchError, RewardId, WatchEntry};

/// Outcome of one availability fetch within a cycle. Either the fetched reward
/// document or the failure that was caught; never persisted.
#[derive(Clone, Debug)]
pub struct CheckResult {
    pub reward_id: RewardId,
    pub data: Option<RewardData>,
    pub error: Option<FetchError>,
}

impl CheckResult {
    pub fn ok(reward_id: RewardId, data: RewardData) -> Self {
        Self {
            reward_id,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(reward_id: RewardId, error: FetchError) -> Self {
        Self {
            reward_id,
            data: None,
            error: Some(error),
        }
    }

    /// Remaining slot count, with `null` treated the same as 0.
    pub fn available(&self) -> i64 {
        self.data
            .as_ref()
            .and_then(|d| d.attributes.remaining)
            .unwrap_or(0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Available,
    Missing,
    Forbidden,
}

/// A notification decision produced by reconciliation, consumed by the
/// dispatcher within the same cycle.
#[derive(Clone, Debug)]
pub struct NotificationAction {
    pub chat_id: i64,
    pub entry: WatchEntry,
    pub kind: ActionKind,
    pub reward: Option<RewardData>,
    pub campaign: Option<CampaignData>,
}

impl NotificationAction {
    pub fn available(entry: WatchEntry, reward: RewardData, campaign: CampaignData) -> Self {
        Self {
            chat_id: entry.chat_id,
            entry,
            kind: ActionKind::Available,
            reward: Some(reward),
            campaign: Some(campaign),
        }
    }

    pub fn missing(entry: WatchEntry) -> Self {
        Self {
            chat_id: entry.chat_id,
            entry,
            kind: ActionKind::Missing,
            reward: None,
            campaign: None,
        }
    }

    pub fn forbidden(entry: WatchEntry) -> Self {
        Self {
            chat_id: entry.chat_id,
            entry,
            kind: ActionKind::Forbidden,
            reward: None,
            campaign: None,
        }
    }
}
