use crate::id::{RedemptionId, RewardId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    pub id: RewardId,
    pub name: String,
    pub description: String,
    pub credit_cost: i64,
    /// None means unlimited stock.
    pub stock: Option<i64>,
    pub active: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert record; the store assigns the id and timestamps.
#[derive(Debug, Clone)]
pub struct NewReward {
    pub name: String,
    pub description: String,
    pub credit_cost: i64,
    pub stock: Option<i64>,
    pub created_by: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    Pending,
    Approved,
    Rejected,
}

/// A request to exchange credits for a reward.
///
/// While pending, `credits_spent` is reserved but not deducted: the balance
/// and the reward stock are only mutated on approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redemption {
    pub id: RedemptionId,
    pub reward_id: RewardId,
    pub user_id: UserId,
    /// Credit cost snapshotted at request time.
    pub credits_spent: i64,
    pub status: RedemptionStatus,
    pub requested_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

/// Insert record; the store assigns the id and timestamp. New redemptions
/// always start pending.
#[derive(Debug, Clone)]
pub struct NewRedemption {
    pub reward_id: RewardId,
    pub user_id: UserId,
    pub credits_spent: i64,
    pub notes: Option<String>,
}
