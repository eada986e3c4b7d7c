use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a reward tier on the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RewardId(pub i64);

impl RewardId {
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let id: i64 = s
            .trim()
            .parse()
            .map_err(|_| IdError::InvalidFormat(s.to_string()))?;
        if id <= 0 {
            return Err(IdError::InvalidFormat(s.to_string()));
        }
        Ok(Self(id))
    }
}

impl fmt::Display for RewardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the campaign a reward belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(pub i64);

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum IdError {
    #[error("invalid id: {0} (expected a positive integer)")]
    InvalidFormat(String),
}

/// The two upstream resource kinds this crate fetches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    Reward,
    Campaign,
}

impl ResourceKind {
    /// Singular form, pluralized in the API path ("{base}/api/{kind}s/{id}").
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Reward => "reward",
            ResourceKind::Campaign => "campaign",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an upstream resource could not be fetched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnavailabilityReason {
    NotFound,
    Forbidden,
    NoCampaign,
}

impl fmt::Display for UnavailabilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailabilityReason::NotFound => write!(f, "not found"),
            UnavailabilityReason::Forbidden => write!(f, "forbidden"),
            UnavailabilityReason::NoCampaign => write!(f, "no campaign"),
        }
    }
}
