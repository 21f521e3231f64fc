use crate::id::{BonusId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable audit record of an out-of-band credit adjustment by an admin.
/// Always paired with a ledger mutation at creation time, never reversed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bonus {
    pub id: BonusId,
    pub user_id: UserId,
    /// Signed adjustment; never zero.
    pub credits: i64,
    pub description: String,
    pub granted_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Insert record; the store assigns the id and timestamp.
#[derive(Debug, Clone)]
pub struct NewBonus {
    pub user_id: UserId,
    pub credits: i64,
    pub description: String,
    pub granted_by: UserId,
}
