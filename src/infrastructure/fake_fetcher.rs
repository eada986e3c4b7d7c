use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::application::RewardFetcher;
use crate::domain::patreon::{
    CampaignAttributes, CampaignRef, CampaignRelationship, Relationships, Resource,
    RewardAttributes,
};
use crate::domain::patreon::{CampaignData, RewardData};
use crate::domain::{CampaignId, FetchError, ResourceKind, RewardId};

const FAKE_CAMPAIGN_ID: i64 = 7;

/// Scriptable fetcher for tests: remaining counts and failures are set per
/// reward and can change between cycles.
#[derive(Clone, Default)]
pub struct FakeFetcher {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    remaining: HashMap<i64, Option<i64>>,
    reward_errors: HashMap<i64, FetchError>,
    campaign_error: Option<FetchError>,
    availability_checks: u64,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_remaining(&self, id: RewardId, remaining: Option<i64>) {
        let mut inner = self.lock();
        inner.remaining.insert(id.0, remaining);
        inner.reward_errors.remove(&id.0);
    }

    pub fn set_not_found(&self, id: RewardId) {
        self.lock()
            .reward_errors
            .insert(id.0, FetchError::not_found(ResourceKind::Reward, id.0));
    }

    pub fn set_forbidden(&self, id: RewardId) {
        self.lock()
            .reward_errors
            .insert(id.0, FetchError::forbidden(ResourceKind::Reward, id.0));
    }

    pub fn set_upstream_error(&self, id: RewardId, status: u16) {
        self.lock().reward_errors.insert(
            id.0,
            FetchError::Upstream {
                kind: ResourceKind::Reward,
                id: id.0,
                status,
            },
        );
    }

    /// Makes every campaign fetch fail until cleared.
    pub fn fail_campaign_fetches(&self, error: Option<FetchError>) {
        self.lock().campaign_error = error;
    }

    pub fn availability_checks(&self) -> u64 {
        self.lock().availability_checks
    }

    fn reward_doc(id: i64, remaining: Option<i64>) -> RewardData {
        let now = Utc::now().fixed_offset();
        Resource {
            id,
            attributes: RewardAttributes {
                amount_cents: 1500,
                title: format!("Reward {id}"),
                remaining,
                url: format!("/rewards/{id}"),
                currency: "USD".to_string(),
                created_at: now,
                edited_at: now,
            },
            relationships: Some(Relationships {
                campaign: Some(CampaignRelationship {
                    data: CampaignRef {
                        id: CampaignId(FAKE_CAMPAIGN_ID),
                    },
                }),
            }),
        }
    }

    fn campaign_doc(id: i64) -> CampaignData {
        let now = Utc::now().fixed_offset();
        Resource {
            id,
            attributes: CampaignAttributes {
                name: format!("Campaign {id}"),
                url: format!("https://example.com/campaigns/{id}"),
                created_at: now,
                published_at: now,
            },
            relationships: None,
        }
    }

    fn reward_result(&self, id: RewardId) -> Result<RewardData, FetchError> {
        let inner = self.lock();
        if let Some(error) = inner.reward_errors.get(&id.0) {
            return Err(error.clone());
        }
        match inner.remaining.get(&id.0) {
            Some(remaining) => Ok(Self::reward_doc(id.0, *remaining)),
            None => Err(FetchError::not_found(ResourceKind::Reward, id.0)),
        }
    }
}

#[async_trait]
impl RewardFetcher for FakeFetcher {
    async fn check_availability(&self, id: RewardId) -> Result<RewardData, FetchError> {
        self.lock().availability_checks += 1;
        self.reward_result(id)
    }

    async fn fetch_reward(&self, id: RewardId, _use_cache: bool) -> Result<RewardData, FetchError> {
        self.reward_result(id)
    }

    async fn fetch_campaign(
        &self,
        id: CampaignId,
        _use_cache: bool,
    ) -> Result<CampaignData, FetchError> {
        if let Some(error) = self.lock().campaign_error.clone() {
            return Err(error);
        }
        Ok(Self::campaign_doc(id.0))
    }

    async fn fetch_campaign_for_reward(
        &self,
        reward: &RewardData,
    ) -> Result<CampaignData, FetchError> {
        let campaign_id = reward.campaign_id().ok_or(FetchError::Unavailable {
            kind: ResourceKind::Campaign,
            id: reward.id,
            reason: crate::domain::UnavailabilityReason::NoCampaign,
        })?;
        self.fetch_campaign(campaign_id, true).await
    }
}
