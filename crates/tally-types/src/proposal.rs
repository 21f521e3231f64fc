use crate::id::{ProposalId, TaskId, UserId};
use crate::task::TaskFrequency;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Approved,
    Rejected,
    Modified,
}

/// Admin decision on a pending proposal. `Approve` and `Modify` both spawn
/// a task; `Modify` signals that the admin changed the terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
    Modify,
}

impl ReviewDecision {
    pub fn status(&self) -> ProposalStatus {
        match self {
            ReviewDecision::Approve => ProposalStatus::Approved,
            ReviewDecision::Reject => ProposalStatus::Rejected,
            ReviewDecision::Modify => ProposalStatus::Modified,
        }
    }

    pub fn spawns_task(&self) -> bool {
        !matches!(self, ReviewDecision::Reject)
    }
}

/// A user-submitted task idea awaiting admin review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub frequency: TaskFrequency,
    pub suggested_reward: i64,
    pub message_to_admin: Option<String>,
    pub status: ProposalStatus,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub admin_notes: Option<String>,
    /// Final terms recorded at review time, possibly adjusted by the admin.
    pub final_title: Option<String>,
    pub final_description: Option<String>,
    pub final_reward: Option<i64>,
    /// The task spawned on approval/modification.
    pub created_task: Option<TaskId>,
    pub created_at: DateTime<Utc>,
}

/// Insert record; the store assigns the id and timestamp. New proposals
/// always start pending.
#[derive(Debug, Clone)]
pub struct NewProposal {
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub frequency: TaskFrequency,
    pub suggested_reward: i64,
    pub message_to_admin: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_mapping() {
        assert_eq!(ReviewDecision::Approve.status(), ProposalStatus::Approved);
        assert_eq!(ReviewDecision::Reject.status(), ProposalStatus::Rejected);
        assert_eq!(ReviewDecision::Modify.status(), ProposalStatus::Modified);

        assert!(ReviewDecision::Approve.spawns_task());
        assert!(ReviewDecision::Modify.spawns_task());
        assert!(!ReviewDecision::Reject.spawns_task());
    }
}
