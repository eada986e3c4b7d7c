use chrono::Utc;

use crate::application::{AppError, AppResult, ChatNotifier, WatchStore};
use crate::domain::{ActionKind, NotificationAction};

/// Sends the chat message matching each notification decision and records the
/// dispatch time for availability notifications.
pub struct DispatchActionsUseCase<'a> {
    pub store: &'a dyn WatchStore,
    pub notifier: &'a dyn ChatNotifier,
}

impl<'a> DispatchActionsUseCase<'a> {
    /// A failed send is logged and skipped; the rest of the batch still goes out.
    pub async fn execute(&self, actions: Vec<NotificationAction>) {
        for action in actions {
            if let Err(e) = self.handle(&action).await {
                tracing::warn!(
                    chat = action.chat_id,
                    reward = %action.entry.reward_id,
                    error = %e,
                    "notification dispatch failed"
                );
            }
        }
    }

    async fn handle(&self, action: &NotificationAction) -> AppResult<()> {
        tracing::debug!(reward = %action.entry.reward_id, kind = ?action.kind, "handling notification action");
        match action.kind {
            ActionKind::Available => {
                let (reward, campaign) = action
                    .reward
                    .as_ref()
                    .zip(action.campaign.as_ref())
                    .ok_or_else(|| {
                        AppError::Notifier("available action without reward/campaign data".into())
                    })?;

                self.notifier
                    .send_available(action.chat_id, reward, campaign)
                    .await?;

                // Only a successful send closes the dedup window.
                let now = Utc::now();
                self.store
                    .set_last_notified(action.entry.id, Some(now))
                    .await?;
                tracing::info!(
                    reward = %action.entry.reward_id,
                    chat = action.chat_id,
                    at = %now,
                    "availability notification sent"
                );
            }
            ActionKind::Missing => {
                self.notifier
                    .send_missing(action.chat_id, action.entry.reward_id)
                    .await?;
            }
            ActionKind::Forbidden => {
                self.notifier
                    .send_forbidden(action.chat_id, action.entry.reward_id)
                    .await?;
            }
        }
        Ok(())
    }
}
