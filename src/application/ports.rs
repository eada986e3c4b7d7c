use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::patreon::{CampaignData, RewardData};
use crate::domain::{CampaignId, FetchError, RewardId, WatchEntry};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("notifier error: {0}")]
    Notifier(String),
    #[error("invalid config: {0}")]
    Config(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// Fetch upstream reward/campaign documents, cache-aware.
#[async_trait]
pub trait RewardFetcher: Send + Sync {
    /// Current availability; bypasses the cache for the read but still warms it.
    async fn check_availability(&self, id: RewardId) -> Result<RewardData, FetchError>;

    async fn fetch_reward(&self, id: RewardId, use_cache: bool) -> Result<RewardData, FetchError>;

    async fn fetch_campaign(
        &self,
        id: CampaignId,
        use_cache: bool,
    ) -> Result<CampaignData, FetchError>;

    /// Resolve and fetch the campaign a reward document points at.
    async fn fetch_campaign_for_reward(
        &self,
        reward: &RewardData,
    ) -> Result<CampaignData, FetchError>;
}

/// Persisted chats and reward-watch entries. Implementations apply each
/// mutation as one transaction.
#[async_trait]
pub trait WatchStore: Send + Sync {
    async fn list_entries(&self) -> AppResult<Vec<WatchEntry>>;

    /// Distinct reward ids across all watch entries; the cycle fetches each once.
    async fn distinct_reward_ids(&self) -> AppResult<Vec<RewardId>>;

    async fn entries_for_reward(&self, reward_id: RewardId) -> AppResult<Vec<WatchEntry>>;

    async fn find_entry(&self, reward_id: RewardId) -> AppResult<Option<WatchEntry>>;

    async fn add_entry(&self, chat_id: i64, reward_id: RewardId) -> AppResult<WatchEntry>;

    /// Persist `is_missing`, `available_since` and `last_notified` for an entry.
    async fn update_entry(&self, entry: &WatchEntry) -> AppResult<()>;

    async fn delete_entry(&self, entry_id: i64) -> AppResult<()>;

    async fn set_last_notified(
        &self,
        entry_id: i64,
        at: Option<DateTime<Utc>>,
    ) -> AppResult<()>;

    /// Reset notification state for every entry of a reward in one statement.
    async fn clear_notification_state(&self, reward_id: RewardId) -> AppResult<()>;

    async fn add_chat(&self, chat_id: i64) -> AppResult<()>;

    /// BCP 47 language tag for a chat, if one was stored.
    async fn chat_locale(&self, chat_id: i64) -> AppResult<Option<String>>;

    async fn set_chat_locale(&self, chat_id: i64, locale: &str) -> AppResult<()>;
}

/// Deliver chat messages, one template per action kind.
#[async_trait]
pub trait ChatNotifier: Send + Sync {
    async fn send_available(
        &self,
        chat_id: i64,
        reward: &RewardData,
        campaign: &CampaignData,
    ) -> AppResult<()>;

    async fn send_missing(&self, chat_id: i64, reward_id: RewardId) -> AppResult<()>;

    async fn send_forbidden(&self, chat_id: i64, reward_id: RewardId) -> AppResult<()>;
}
