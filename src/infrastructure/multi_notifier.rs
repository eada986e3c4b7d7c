use async_trait::async_trait;

use crate::application::{AppResult, ChatNotifier};
use crate::domain::patreon::{CampaignData, RewardData};
use crate::domain::RewardId;

/// Fans one notification out to every configured channel. A failing channel
/// must not stop the others; the last error is surfaced afterwards.
pub struct MultiNotifier {
    notifiers: Vec<Box<dyn ChatNotifier>>,
}

impl MultiNotifier {
    pub fn new(notifiers: Vec<Box<dyn ChatNotifier>>) -> Self {
        Self { notifiers }
    }
}

#[async_trait]
impl ChatNotifier for MultiNotifier {
    async fn send_available(
        &self,
        chat_id: i64,
        reward: &RewardData,
        campaign: &CampaignData,
    ) -> AppResult<()> {
        let mut last_err = None;
        for n in &self.notifiers {
            if let Err(e) = n.send_available(chat_id, reward, campaign).await {
                last_err = Some(e);
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn send_missing(&self, chat_id: i64, reward_id: RewardId) -> AppResult<()> {
        let mut last_err = None;
        for n in &self.notifiers {
            if let Err(e) = n.send_missing(chat_id, reward_id).await {
                last_err = Some(e);
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn send_forbidden(&self, chat_id: i64, reward_id: RewardId) -> AppResult<()> {
        let mut last_err = None;
        for n in &self.notifiers {
            if let Err(e) = n.send_forbidden(chat_id, reward_id).await {
                last_err = Some(e);
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
