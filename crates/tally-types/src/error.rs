use crate::id::RewardId;
use thiserror::Error;

/// Result type for all core operations
pub type Result<T> = std::result::Result<T, TallyError>;

/// Errors surfaced by the chore-economy core.
///
/// Every variant is detected synchronously before any mutation is committed;
/// storage failures roll back the enclosing operation and surface as
/// `Storage`. None are retried internally.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: u64 },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient credits: required {required}, available {available}")]
    InsufficientCredits { required: i64, available: i64 },

    #[error("reward {reward} is out of stock")]
    OutOfStock { reward: RewardId },

    #[error("reward {reward} is not available")]
    Unavailable { reward: RewardId },

    #[error("storage error: {0}")]
    Storage(String),
}

impl TallyError {
    pub fn not_found(kind: &'static str, id: impl Into<u64>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
