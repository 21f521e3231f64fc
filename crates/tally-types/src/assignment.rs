use crate::error::TallyError;
use crate::id::{AssignmentId, CompletionId, TaskId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One task bound to one user for one calendar date.
///
/// Invariants: `validated` implies `completed`; `completed` and `cancelled`
/// are never both true; at most one live completion exists per assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub task_id: TaskId,
    pub user_id: UserId,
    pub assigned_date: NaiveDate,
    pub completed: bool,
    pub validated: bool,
    pub cancelled: bool,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub assigned_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    /// Neither completed nor cancelled: still actionable by the user.
    pub fn is_pending(&self) -> bool {
        !self.completed && !self.cancelled
    }
}

/// Insert record; the store assigns the id and creation timestamp. New
/// assignments always start pending.
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub task_id: TaskId,
    pub user_id: UserId,
    pub assigned_date: NaiveDate,
    pub assigned_by: UserId,
}

/// Admin quality rating for a completed task, converting to a fractional
/// credit payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ValidationScore {
    One,
    Two,
    Three,
}

impl ValidationScore {
    /// Credits granted for this score, truncating toward zero.
    pub fn payout(&self, base_value: i64) -> i64 {
        match self {
            ValidationScore::One => base_value * 10 / 100,
            ValidationScore::Two => base_value * 60 / 100,
            ValidationScore::Three => base_value,
        }
    }
}

impl TryFrom<u8> for ValidationScore {
    type Error = TallyError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(ValidationScore::One),
            2 => Ok(ValidationScore::Two),
            3 => Ok(ValidationScore::Three),
            other => Err(TallyError::InvalidInput(format!(
                "validation score must be 1, 2 or 3, got {}",
                other
            ))),
        }
    }
}

impl From<ValidationScore> for u8 {
    fn from(score: ValidationScore) -> Self {
        match score {
            ValidationScore::One => 1,
            ValidationScore::Two => 2,
            ValidationScore::Three => 3,
        }
    }
}

/// Record created when a user completes an assignment. Validation fields
/// stay empty until an admin scores it; `credits_awarded` is 0 until then.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub id: CompletionId,
    pub assignment_id: AssignmentId,
    pub task_id: TaskId,
    pub user_id: UserId,
    pub completed_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub validation_score: Option<ValidationScore>,
    pub validated_by: Option<UserId>,
    pub validated_at: Option<DateTime<Utc>>,
    pub validation_notes: Option<String>,
    pub credits_awarded: i64,
}

impl Completion {
    pub fn is_validated(&self) -> bool {
        self.validation_score.is_some()
    }
}

/// Insert record; the store assigns the id and rejects a second live
/// completion for the same assignment.
#[derive(Debug, Clone)]
pub struct NewCompletion {
    pub assignment_id: AssignmentId,
    pub task_id: TaskId,
    pub user_id: UserId,
    pub completed_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payout_fractions() {
        assert_eq!(ValidationScore::One.payout(100), 10);
        assert_eq!(ValidationScore::Two.payout(100), 60);
        assert_eq!(ValidationScore::Three.payout(100), 100);
    }

    #[test]
    fn test_payout_truncates() {
        // 29 * 0.10 = 2.9 -> 2; 29 * 0.60 = 17.4 -> 17
        assert_eq!(ValidationScore::One.payout(29), 2);
        assert_eq!(ValidationScore::Two.payout(29), 17);
        assert_eq!(ValidationScore::Three.payout(29), 29);
    }

    #[test]
    fn test_score_bounds() {
        assert!(ValidationScore::try_from(0).is_err());
        assert!(ValidationScore::try_from(4).is_err());
        assert_eq!(ValidationScore::try_from(2).unwrap(), ValidationScore::Two);
    }

    #[test]
    fn test_score_wire_format() {
        let json = serde_json::to_string(&ValidationScore::Three).unwrap();
        assert_eq!(json, "3");
        let back: ValidationScore = serde_json::from_str("1").unwrap();
        assert_eq!(back, ValidationScore::One);
    }
}
