//! Wire model for the upstream JSON:API-shaped documents.
//!
//! Shape: `{ "data": { "id", "attributes": {...}, "relationships": { "campaign":
//! { "data": { "id" } } } } }`. Unknown attributes and relationships are ignored.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::{CampaignId, RewardId};

/// Top-level envelope of a single-resource response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document<T> {
    pub data: Resource<T>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource<T> {
    pub id: i64,
    pub attributes: T,
    #[serde(default)]
    pub relationships: Option<Relationships>,
}

pub type RewardData = Resource<RewardAttributes>;
pub type CampaignData = Resource<CampaignAttributes>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardAttributes {
    pub amount_cents: i64,
    pub title: String,
    /// Remaining slot count; `null` or 0 means the reward is taken.
    #[serde(default)]
    pub remaining: Option<i64>,
    /// Site-relative path, absolute only when joined with the base domain.
    pub url: String,
    /// ISO 4217 currency code.
    pub currency: String,
    pub created_at: DateTime<FixedOffset>,
    pub edited_at: DateTime<FixedOffset>,
}

impl RewardAttributes {
    pub fn full_url(&self, base_domain: &str) -> String {
        format!("{}{}", base_domain.trim_end_matches('/'), self.url)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CampaignAttributes {
    pub name: String,
    /// Absolute URL of the creator page.
    pub url: String,
    pub created_at: DateTime<FixedOffset>,
    pub published_at: DateTime<FixedOffset>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationships {
    #[serde(default)]
    pub campaign: Option<CampaignRelationship>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CampaignRelationship {
    pub data: CampaignRef,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CampaignRef {
    pub id: CampaignId,
}

impl Resource<RewardAttributes> {
    pub fn reward_id(&self) -> RewardId {
        RewardId(self.id)
    }

    /// Campaign this reward belongs to, if the relationship is present.
    pub fn campaign_id(&self) -> Option<CampaignId> {
        self.relationships
            .as_ref()
            .and_then(|r| r.campaign.as_ref())
            .map(|c| c.data.id)
    }
}

impl Resource<CampaignAttributes> {
    pub fn campaign_id(&self) -> CampaignId {
        CampaignId(self.id)
    }
}
