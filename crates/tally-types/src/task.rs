use crate::id::{TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Behavior class of a task. The credit rules dispatch on this: mandatory
/// tasks penalize cancellation and pay nothing on validation, every other
/// type pays on validation and cancels for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Mandatory,
    Bonus,
    Proposed,
}

impl TaskType {
    pub fn penalizes_on_cancel(&self) -> bool {
        matches!(self, TaskType::Mandatory)
    }

    pub fn rewards_on_validate(&self) -> bool {
        !matches!(self, TaskType::Mandatory)
    }
}

/// Recurrence hint carried on the task definition. The bulk scheduler takes
/// its own recurrence rule; this field only describes the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFrequency {
    Daily,
    Weekly,
    Monthly,
    OneTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Active,
    Inactive,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub task_type: TaskType,
    pub frequency: TaskFrequency,
    /// Full-credit amount for rewarding types, penalty amount for mandatory.
    pub base_value: i64,
    pub status: TaskStatus,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert record; the store assigns the id and timestamps.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub task_type: TaskType,
    pub frequency: TaskFrequency,
    pub base_value: i64,
    pub created_by: UserId,
}
