use futures::future::join_all;
use chrono::Utc;

use crate::application::usecases::DispatchActionsUseCase;
use crate::application::{AppResult, RewardFetcher, WatchStore};
use crate::domain::{
    ActionKind, CheckPolicy, CheckResult, FetchError, NotificationAction, RewardId,
    UnavailabilityReason, WatchEntry,
};

/// One availability-check cycle: fetch every distinct tracked reward, reconcile
/// each watch entry against the result, dispatch the notification decisions.
pub struct CheckRewardsUseCase<'a> {
    pub store: &'a dyn WatchStore,
    pub fetcher: &'a dyn RewardFetcher,
    pub dispatch: DispatchActionsUseCase<'a>,
    pub policy: CheckPolicy,
}

impl<'a> CheckRewardsUseCase<'a> {
    /// Runs one cycle and returns the number of AVAILABLE notifications produced.
    pub async fn execute(&self) -> AppResult<usize> {
        tracing::info!("checking reward availability");
        let ids = self.store.distinct_reward_ids().await?;

        // Checks run concurrently but dispatch is staggered so a large watch
        // list does not burst the upstream API. Failures are captured per
        // reward, never propagated.
        let checks = ids.iter().enumerate().map(|(i, &id)| {
            let stagger = self.policy.dispatch_stagger * i as u32;
            async move {
                tokio::time::sleep(stagger).await;
                tracing::debug!(reward = %id, "starting availability check");
                self.check_reward(id).await
            }
        });
        let results = join_all(checks).await;

        let mut actions = Vec::new();
        for result in &results {
            actions.extend(self.reconcile(result).await);
        }

        let available = actions
            .iter()
            .filter(|a| a.kind == ActionKind::Available)
            .count();

        self.dispatch.execute(actions).await;

        tracing::info!(available, "available rewards found");
        Ok(available)
    }

    async fn check_reward(&self, id: RewardId) -> CheckResult {
        match self.fetcher.check_availability(id).await {
            Ok(data) => CheckResult::ok(id, data),
            Err(e) => CheckResult::err(id, e),
        }
    }

    /// Entry isolation: a storage failure while reconciling one reward must not
    /// abort the rest of the batch.
    async fn reconcile(&self, result: &CheckResult) -> Vec<NotificationAction> {
        match self.reconcile_inner(result).await {
            Ok(actions) => actions,
            Err(e) => {
                tracing::error!(reward = %result.reward_id, error = %e, "reconciliation failed");
                Vec::new()
            }
        }
    }

    async fn reconcile_inner(&self, result: &CheckResult) -> AppResult<Vec<NotificationAction>> {
        // Fast path: nothing available and nothing wrong, reset state in bulk.
        if self.policy.skip_entry_check_if_empty_and_no_error
            && result.error.is_none()
            && result.available() == 0
        {
            self.store.clear_notification_state(result.reward_id).await?;
            return Ok(Vec::new());
        }

        let entries = self.store.entries_for_reward(result.reward_id).await?;
        let mut actions = Vec::new();
        for entry in entries {
            if let Some(action) = self.reconcile_entry(result, entry).await? {
                actions.push(action);
            }
        }
        Ok(actions)
    }

    async fn reconcile_entry(
        &self,
        result: &CheckResult,
        entry: WatchEntry,
    ) -> AppResult<Option<NotificationAction>> {
        if let Some(error) = &result.error {
            return self.handle_fetch_error(error, entry).await;
        }

        let mut updated = entry;
        updated.is_missing = false;

        if result.available() > 0 {
            tracing::debug!(reward = %result.reward_id, slots = result.available(), "slots available");
            return self.handle_available(result, updated).await;
        }

        // Taken again: close the availability window so the next time slots
        // open up it counts as a new one.
        updated.available_since = None;
        updated.last_notified = None;
        self.store.update_entry(&updated).await?;
        Ok(None)
    }

    async fn handle_fetch_error(
        &self,
        error: &FetchError,
        entry: WatchEntry,
    ) -> AppResult<Option<NotificationAction>> {
        match error.unavailability() {
            Some(UnavailabilityReason::NotFound) => {
                tracing::warn!(reward = %entry.reward_id, "reward not found");
                if self.policy.remove_missing_rewards {
                    tracing::info!(reward = %entry.reward_id, entry = entry.id, "removing missing reward from the watch list");
                    self.store.delete_entry(entry.id).await?;
                    return Ok(None);
                }
                let notify = self.policy.notify_on_missing_rewards && !entry.is_missing;
                let mut updated = entry;
                updated.is_missing = true;
                self.store.update_entry(&updated).await?;
                Ok(notify.then(|| NotificationAction::missing(updated)))
            }
            Some(UnavailabilityReason::Forbidden) => {
                tracing::warn!(reward = %entry.reward_id, "access to reward is forbidden");
                let notify = self.policy.notify_on_forbidden_rewards && !entry.is_missing;
                let mut updated = entry;
                updated.is_missing = true;
                self.store.update_entry(&updated).await?;
                Ok(notify.then(|| NotificationAction::forbidden(updated)))
            }
            _ => {
                // Unexpected upstream/transport failure: leave the entry as-is,
                // the next cycle retries.
                tracing::warn!(reward = %entry.reward_id, error = %error, "fetch failed, skipping this cycle");
                Ok(None)
            }
        }
    }

    async fn handle_available(
        &self,
        result: &CheckResult,
        mut entry: WatchEntry,
    ) -> AppResult<Option<NotificationAction>> {
        let Some(reward) = result.data.as_ref() else {
            tracing::warn!(reward = %result.reward_id, "reward data empty for available result");
            return Ok(None);
        };

        if entry.available_since.is_none() {
            entry.available_since = Some(Utc::now());
        }
        self.store.update_entry(&entry).await?;

        if !entry.needs_notification() {
            tracing::info!(reward = %entry.reward_id, "availability already notified, skipping");
            return Ok(None);
        }

        match self.fetcher.fetch_campaign_for_reward(reward).await {
            Ok(campaign) => Ok(Some(NotificationAction::available(
                entry,
                reward.clone(),
                campaign,
            ))),
            Err(e) => {
                // No action means last_notified stays unset and the next cycle
                // tries again.
                tracing::warn!(reward = %entry.reward_id, error = %e, "campaign fetch failed, notification postponed");
                Ok(None)
            }
        }
    }
}
