use async_trait::async_trait;

use crate::application::{AppResult, ChatNotifier};
use crate::domain::patreon::{CampaignData, RewardData};
use crate::domain::RewardId;

/// Prints notifications instead of sending them; the only channel in --dry-run.
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatNotifier for ConsoleNotifier {
    async fn send_available(
        &self,
        chat_id: i64,
        reward: &RewardData,
        campaign: &CampaignData,
    ) -> AppResult<()> {
        println!(
            "NOTIFY chat={} available reward={} title={:?} remaining={:?} campaign={:?}",
            chat_id,
            reward.id,
            reward.attributes.title,
            reward.attributes.remaining,
            campaign.attributes.name,
        );
        Ok(())
    }

    async fn send_missing(&self, chat_id: i64, reward_id: RewardId) -> AppResult<()> {
        println!("NOTIFY chat={chat_id} missing reward={reward_id}");
        Ok(())
    }

    async fn send_forbidden(&self, chat_id: i64, reward_id: RewardId) -> AppResult<()> {
        println!("NOTIFY chat={chat_id} forbidden reward={reward_id}");
        Ok(())
    }
}
