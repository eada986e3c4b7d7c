use super::{ResourceKind, UnavailabilityReason};

/// Failure modes of a single upstream fetch.
///
/// `Unavailable` is recoverable and drives the reconciliation policy branches;
/// everything else is logged and retried on the next cycle.
#[derive(Clone, Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{kind} {id} is unavailable: {reason}")]
    Unavailable {
        kind: ResourceKind,
        id: i64,
        reason: UnavailabilityReason,
    },
    #[error("unexpected status {status} fetching {kind} {id}")]
    Upstream {
        kind: ResourceKind,
        id: i64,
        status: u16,
    },
    #[error("transport error fetching {kind} {id}: {message}")]
    Transport {
        kind: ResourceKind,
        id: i64,
        message: String,
    },
}

impl FetchError {
    pub fn not_found(kind: ResourceKind, id: i64) -> Self {
        FetchError::Unavailable {
            kind,
            id,
            reason: UnavailabilityReason::NotFound,
        }
    }

    pub fn forbidden(kind: ResourceKind, id: i64) -> Self {
        FetchError::Unavailable {
            kind,
            id,
            reason: UnavailabilityReason::Forbidden,
        }
    }

    /// The unavailability reason, if this is the recoverable variant.
    pub fn unavailability(&self) -> Option<UnavailabilityReason> {
        match self {
            FetchError::Unavailable { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}
