use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;

use crate::application::RewardFetcher;
use crate::domain::patreon::{CampaignData, Document, RewardData};
use crate::domain::{CampaignId, FetchError, ResourceKind, RewardId, UnavailabilityReason};
use crate::infrastructure::ttl_cache::TtlCache;

/// Cache knobs for the fetcher, sourced from `run.*` config.
#[derive(Clone, Debug)]
pub struct FetchCacheConfig {
    pub enabled: bool,
    pub validity: Duration,
    pub eviction_period: Duration,
    pub rewards_max_size: usize,
    pub campaigns_max_size: usize,
}

/// Fetches reward and campaign documents from `{base_domain}/api/{kind}s/{id}`,
/// front-ended by one TTL cache per resource kind.
pub struct PatreonFetcher {
    http: reqwest::Client,
    base_domain: String,
    use_cache: bool,
    eviction_period: Duration,
    rewards_cache: TtlCache<i64, RewardData>,
    campaigns_cache: TtlCache<i64, CampaignData>,
}

impl PatreonFetcher {
    pub fn new(http: reqwest::Client, base_domain: impl Into<String>, cache: FetchCacheConfig) -> Self {
        Self {
            http,
            base_domain: base_domain.into(),
            use_cache: cache.enabled,
            eviction_period: cache.eviction_period,
            rewards_cache: TtlCache::new(cache.validity, cache.rewards_max_size),
            campaigns_cache: TtlCache::new(cache.validity, cache.campaigns_max_size),
        }
    }

    /// Starts the periodic eviction pass over both caches. Not started at all
    /// when caching is globally disabled.
    pub fn spawn_cache_eviction(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.use_cache {
            return None;
        }
        let fetcher = Arc::clone(self);
        Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(fetcher.eviction_period).await;
                tracing::debug!("evicting rewards cache");
                fetcher.rewards_cache.evict_expired_and_overflow();
                tracing::debug!("evicting campaigns cache");
                fetcher.campaigns_cache.evict_expired_and_overflow();
            }
        }))
    }

    async fn get_document<T: DeserializeOwned>(
        &self,
        kind: ResourceKind,
        id: i64,
    ) -> Result<Document<T>, FetchError> {
        let url = format!(
            "{}/api/{}s/{}",
            self.base_domain.trim_end_matches('/'),
            kind,
            id
        );

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                kind,
                id,
                message: e.to_string(),
            })?;

        match resp.status() {
            StatusCode::NOT_FOUND => return Err(FetchError::not_found(kind, id)),
            StatusCode::FORBIDDEN => return Err(FetchError::forbidden(kind, id)),
            s if !s.is_success() => {
                return Err(FetchError::Upstream {
                    kind,
                    id,
                    status: s.as_u16(),
                })
            }
            _ => {}
        }

        resp.json::<Document<T>>()
            .await
            .map_err(|e| FetchError::Transport {
                kind,
                id,
                message: e.to_string(),
            })
    }

    async fn fetch_reward_uncached(&self, id: RewardId) -> Result<RewardData, FetchError> {
        let doc = self.get_document(ResourceKind::Reward, id.0).await?;
        Ok(doc.data)
    }

    async fn fetch_campaign_uncached(&self, id: CampaignId) -> Result<CampaignData, FetchError> {
        let doc = self.get_document(ResourceKind::Campaign, id.0).await?;
        Ok(doc.data)
    }
}

#[async_trait]
impl RewardFetcher for PatreonFetcher {
    async fn check_availability(&self, id: RewardId) -> Result<RewardData, FetchError> {
        tracing::debug!(reward = %id, "checking availability");
        // Current availability must never come out of the cache; the fresh
        // result still lands in it for other readers.
        self.fetch_reward(id, false).await
    }

    async fn fetch_reward(&self, id: RewardId, use_cache: bool) -> Result<RewardData, FetchError> {
        tracing::debug!(reward = %id, "fetching reward");
        if !self.use_cache {
            tracing::trace!(reward = %id, "cache disabled globally, skipping");
            return self.fetch_reward_uncached(id).await;
        }

        if use_cache {
            if let Some(hit) = self.rewards_cache.get_if_valid(&id.0) {
                tracing::trace!(reward = %id, "cache hit");
                return Ok(hit);
            }
            tracing::trace!(reward = %id, "cache miss");
        }

        let data = self.fetch_reward_uncached(id).await?;
        // Keyed by the id the response carries, which tolerates aliased ids.
        self.rewards_cache.put(data.id, data.clone());
        Ok(data)
    }

    async fn fetch_campaign(
        &self,
        id: CampaignId,
        use_cache: bool,
    ) -> Result<CampaignData, FetchError> {
        tracing::debug!(campaign = %id, "fetching campaign");
        if !self.use_cache {
            tracing::trace!(campaign = %id, "cache disabled globally, skipping");
            return self.fetch_campaign_uncached(id).await;
        }

        if use_cache {
            if let Some(hit) = self.campaigns_cache.get_if_valid(&id.0) {
                tracing::trace!(campaign = %id, "cache hit");
                return Ok(hit);
            }
            tracing::trace!(campaign = %id, "cache miss");
        }

        let data = self.fetch_campaign_uncached(id).await?;
        self.campaigns_cache.put(data.id, data.clone());
        Ok(data)
    }

    async fn fetch_campaign_for_reward(
        &self,
        reward: &RewardData,
    ) -> Result<CampaignData, FetchError> {
        let campaign_id = reward.campaign_id().ok_or(FetchError::Unavailable {
            kind: ResourceKind::Campaign,
            id: reward.id,
            reason: UnavailabilityReason::NoCampaign,
        })?;
        self.fetch_campaign(campaign_id, true).await
    }
}
