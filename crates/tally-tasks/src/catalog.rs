use chrono::Utc;
use std::sync::Arc;
use tally_store::ChoreStore;
use tally_types::{
    Actor, NewTask, Result, TallyError, Task, TaskFrequency, TaskId, TaskStatus, TaskType,
};
use tracing::info;

/// Fields for a new task definition; the acting admin becomes `created_by`.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub title: String,
    pub description: String,
    pub task_type: TaskType,
    pub frequency: TaskFrequency,
    pub base_value: i64,
}

/// Partial update for a task definition; None leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub task_type: Option<TaskType>,
    pub frequency: Option<TaskFrequency>,
    pub base_value: Option<i64>,
    pub status: Option<TaskStatus>,
}

/// Task definition catalog. Definitions referenced by assignments change
/// only through an explicit admin edit here.
pub struct TaskCatalog {
    store: Arc<dyn ChoreStore>,
}

impl TaskCatalog {
    pub fn new(store: Arc<dyn ChoreStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, actor: &Actor, spec: TaskSpec) -> Result<Task> {
        actor.ensure_admin()?;
        let task = self
            .store
            .insert_task(NewTask {
                title: spec.title,
                description: spec.description,
                task_type: spec.task_type,
                frequency: spec.frequency,
                base_value: spec.base_value,
                created_by: actor.user_id,
            })
            .await?;
        info!(task = %task.id, ?task.task_type, value = task.base_value, "📋 Task created");
        Ok(task)
    }

    pub async fn update(&self, actor: &Actor, id: TaskId, update: TaskUpdate) -> Result<Task> {
        actor.ensure_admin()?;
        let mut task = self.task(id).await?;

        if let Some(title) = update.title {
            task.title = title;
        }
        if let Some(description) = update.description {
            task.description = description;
        }
        if let Some(task_type) = update.task_type {
            task.task_type = task_type;
        }
        if let Some(frequency) = update.frequency {
            task.frequency = frequency;
        }
        if let Some(base_value) = update.base_value {
            task.base_value = base_value;
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        task.updated_at = Utc::now();

        self.store.put_task(task.clone()).await?;
        Ok(task)
    }

    /// Soft delete: archived tasks keep their assignment history but no
    /// longer appear to members.
    pub async fn archive(&self, actor: &Actor, id: TaskId) -> Result<Task> {
        actor.ensure_admin()?;
        let mut task = self.task(id).await?;
        task.status = TaskStatus::Archived;
        task.updated_at = Utc::now();
        self.store.put_task(task.clone()).await?;
        info!(task = %id, "📋 Task archived");
        Ok(task)
    }

    pub async fn task(&self, id: TaskId) -> Result<Task> {
        self.store
            .get_task(id)
            .await?
            .ok_or_else(|| TallyError::not_found("task", id))
    }

    /// Admins see every definition, members only active ones.
    pub async fn list(&self, actor: &Actor) -> Result<Vec<Task>> {
        let tasks = self.store.list_tasks().await?;
        if actor.role.is_admin() {
            Ok(tasks)
        } else {
            Ok(tasks
                .into_iter()
                .filter(|t| t.status == TaskStatus::Active)
                .collect())
        }
    }
}
