use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tally_economics::Ledger;
use tally_store::ChoreStore;
use tally_types::{
    Actor, Assignment, AssignmentId, Completion, CompletionId, NewAssignment, NewCompletion,
    Result, TallyError, TaskId, UserId, ValidationScore,
};
use tracing::{info, warn};

/// Per-assignment lifecycle: pending → completed → validated, or
/// pending → cancelled, with admin Reset reversing either branch.
///
/// Credit effects ride along inside the same transaction as the flag they
/// belong to: the cancellation penalty with `cancelled`, the validation
/// payout with `validated`, the reversals with Reset.
pub struct AssignmentManager {
    store: Arc<dyn ChoreStore>,
    ledger: Arc<Ledger>,
}

impl AssignmentManager {
    pub fn new(store: Arc<dyn ChoreStore>, ledger: Arc<Ledger>) -> Self {
        Self { store, ledger }
    }

    /// Assigns a task to a user for a specific date. One assignment per
    /// (task, user, date) through this path; the bulk daily scheduler is
    /// the only place duplicates are allowed.
    pub async fn assign(
        &self,
        actor: &Actor,
        task_id: TaskId,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Assignment> {
        actor.ensure_admin()?;
        self.store
            .get_task(task_id)
            .await?
            .ok_or_else(|| TallyError::not_found("task", task_id))?;
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| TallyError::not_found("user", user_id))?;

        if self
            .store
            .find_assignment(task_id, user_id, date)
            .await?
            .is_some()
        {
            return Err(TallyError::conflict(format!(
                "task {} already assigned to user {} for {}",
                task_id, user_id, date
            )));
        }

        let assignment = self
            .store
            .insert_assignment(NewAssignment {
                task_id,
                user_id,
                assigned_date: date,
                assigned_by: actor.user_id,
            })
            .await?;
        info!(assignment = %assignment.id, task = %task_id, user = %user_id, %date, "📌 Task assigned");
        Ok(assignment)
    }

    /// Marks an assignment completed, creating its completion record. Only
    /// the assigned user may complete, and only from the pending state;
    /// credits are not touched until validation.
    pub async fn complete(
        &self,
        actor: &Actor,
        id: AssignmentId,
        notes: Option<String>,
    ) -> Result<Completion> {
        let assignment = self.assignment(id).await?;
        actor.ensure_owner(assignment.user_id)?;

        if assignment.completed {
            return Err(TallyError::conflict(format!(
                "assignment {} already completed",
                id
            )));
        }
        if assignment.cancelled {
            return Err(TallyError::conflict(format!(
                "assignment {} has been cancelled",
                id
            )));
        }

        self.store.begin_transaction().await?;
        let result: Result<Completion> = async {
            let completion = self
                .store
                .insert_completion(NewCompletion {
                    assignment_id: id,
                    task_id: assignment.task_id,
                    user_id: assignment.user_id,
                    completed_at: Utc::now(),
                    notes,
                })
                .await?;

            let mut assignment = assignment.clone();
            assignment.completed = true;
            self.store.put_assignment(assignment).await?;
            Ok(completion)
        }
        .await;

        match result {
            Ok(completion) => {
                self.store.commit_transaction().await?;
                info!(assignment = %id, completion = %completion.id, "☑️ Assignment completed");
                Ok(completion)
            }
            Err(e) => {
                warn!(assignment = %id, error = %e, "❌ Completion rolled back");
                self.store.rollback_transaction().await?;
                Err(e)
            }
        }
    }

    /// Cancels a pending assignment. Cancelling a mandatory task applies
    /// the penalty immediately, in the same transaction as the flag.
    /// Returns the assignment and the penalty applied (0 for free types).
    pub async fn cancel(&self, actor: &Actor, id: AssignmentId) -> Result<(Assignment, i64)> {
        let assignment = self.assignment(id).await?;
        actor.ensure_owner(assignment.user_id)?;

        if assignment.completed {
            return Err(TallyError::conflict(format!(
                "assignment {} already completed",
                id
            )));
        }
        if assignment.cancelled {
            return Err(TallyError::conflict(format!(
                "assignment {} already cancelled",
                id
            )));
        }

        let task = self
            .store
            .get_task(assignment.task_id)
            .await?
            .ok_or_else(|| TallyError::not_found("task", assignment.task_id))?;

        self.store.begin_transaction().await?;
        let result: Result<(Assignment, i64)> = async {
            let mut assignment = assignment.clone();
            assignment.cancelled = true;
            assignment.cancelled_at = Some(Utc::now());
            self.store.put_assignment(assignment.clone()).await?;

            let penalty = if task.task_type.penalizes_on_cancel() {
                self.ledger
                    .apply_delta(assignment.user_id, -task.base_value)
                    .await?;
                task.base_value
            } else {
                0
            };
            Ok((assignment, penalty))
        }
        .await;

        match result {
            Ok((assignment, penalty)) => {
                self.store.commit_transaction().await?;
                info!(assignment = %id, penalty, "🚫 Assignment cancelled");
                Ok((assignment, penalty))
            }
            Err(e) => {
                warn!(assignment = %id, error = %e, "❌ Cancellation rolled back");
                self.store.rollback_transaction().await?;
                Err(e)
            }
        }
    }

    /// Scores a completion and pays out its credits. Admin-only; the raw
    /// score is validated up front, the already-scored conflict on the row
    /// read inside the transaction.
    pub async fn validate(
        &self,
        actor: &Actor,
        id: CompletionId,
        raw_score: u8,
        notes: Option<String>,
    ) -> Result<Completion> {
        actor.ensure_admin()?;
        let score = ValidationScore::try_from(raw_score)?;

        self.store.begin_transaction().await?;
        let result = self.validate_inner(actor, id, score, notes).await;

        match result {
            Ok(completion) => {
                self.store.commit_transaction().await?;
                info!(
                    completion = %id,
                    score = raw_score,
                    credits = completion.credits_awarded,
                    "⭐ Completion validated"
                );
                Ok(completion)
            }
            Err(e) => {
                warn!(completion = %id, error = %e, "❌ Validation rolled back");
                self.store.rollback_transaction().await?;
                Err(e)
            }
        }
    }

    async fn validate_inner(
        &self,
        actor: &Actor,
        id: CompletionId,
        score: ValidationScore,
        notes: Option<String>,
    ) -> Result<Completion> {
        let mut completion = self
            .store
            .get_completion(id)
            .await?
            .ok_or_else(|| TallyError::not_found("completion", id))?;

        if completion.is_validated() {
            return Err(TallyError::conflict(format!(
                "completion {} already validated",
                id
            )));
        }

        let task = self
            .store
            .get_task(completion.task_id)
            .await?
            .ok_or_else(|| TallyError::not_found("task", completion.task_id))?;

        // Mandatory tasks pay nothing; their only credit effect is the
        // cancellation penalty.
        let credits = if task.task_type.rewards_on_validate() {
            score.payout(task.base_value)
        } else {
            0
        };

        completion.validation_score = Some(score);
        completion.validated_by = Some(actor.user_id);
        completion.validated_at = Some(Utc::now());
        completion.validation_notes = notes;
        completion.credits_awarded = credits;
        self.store.put_completion(completion.clone()).await?;

        let mut assignment = self.assignment(completion.assignment_id).await?;
        assignment.validated = true;
        self.store.put_assignment(assignment).await?;

        self.ledger.apply_delta(completion.user_id, credits).await?;
        Ok(completion)
    }

    /// Returns an assignment to pending, reversing whatever the current
    /// state committed: a validated completion's payout, or a mandatory
    /// cancellation's penalty. Both flags are handled defensively even
    /// though they should never be set together.
    pub async fn reset(&self, actor: &Actor, id: AssignmentId) -> Result<Assignment> {
        actor.ensure_admin()?;
        let assignment = self.assignment(id).await?;

        self.store.begin_transaction().await?;
        let result = self.reset_inner(assignment).await;

        match result {
            Ok(assignment) => {
                self.store.commit_transaction().await?;
                info!(assignment = %id, "🔄 Assignment reset");
                Ok(assignment)
            }
            Err(e) => {
                warn!(assignment = %id, error = %e, "❌ Reset rolled back");
                self.store.rollback_transaction().await?;
                Err(e)
            }
        }
    }

    async fn reset_inner(&self, mut assignment: Assignment) -> Result<Assignment> {
        if assignment.completed {
            if let Some(completion) = self
                .store
                .completion_for_assignment(assignment.id)
                .await?
            {
                if completion.credits_awarded != 0 {
                    self.ledger
                        .apply_delta(assignment.user_id, -completion.credits_awarded)
                        .await?;
                }
                self.store.delete_completion(completion.id).await?;
            }
            assignment.completed = false;
            assignment.validated = false;
        }

        if assignment.cancelled {
            let task = self
                .store
                .get_task(assignment.task_id)
                .await?
                .ok_or_else(|| TallyError::not_found("task", assignment.task_id))?;
            if task.task_type.penalizes_on_cancel() {
                self.ledger
                    .apply_delta(assignment.user_id, task.base_value)
                    .await?;
            }
            assignment.cancelled = false;
            assignment.cancelled_at = None;
        }

        self.store.put_assignment(assignment.clone()).await?;
        Ok(assignment)
    }

    pub async fn assignment(&self, id: AssignmentId) -> Result<Assignment> {
        self.store
            .get_assignment(id)
            .await?
            .ok_or_else(|| TallyError::not_found("assignment", id))
    }

    /// Completions awaiting a score, newest first.
    pub async fn pending_validations(&self, actor: &Actor) -> Result<Vec<Completion>> {
        actor.ensure_admin()?;
        self.store.pending_validations().await
    }

    /// Cancelled assignments for admin review, newest first.
    pub async fn cancelled(&self, actor: &Actor) -> Result<Vec<Assignment>> {
        actor.ensure_admin()?;
        self.store.cancelled_assignments().await
    }

    /// Calendar view over a date range. Members may only look at their own.
    pub async fn calendar(
        &self,
        actor: &Actor,
        user: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Assignment>> {
        actor.ensure_self_or_admin(user)?;
        if start > end {
            return Err(TallyError::invalid("start date is after end date"));
        }
        self.store
            .assignments_for_user_in_range(user, start, end)
            .await
    }
}
