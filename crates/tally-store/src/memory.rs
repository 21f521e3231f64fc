use crate::ChoreStore;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tally_types::{
    Assignment, AssignmentId, Bonus, BonusId, Completion, CompletionId, NewAssignment, NewBonus,
    NewCompletion, NewProposal, NewRedemption, NewReward, NewTask, NewUser, Proposal, ProposalId,
    ProposalStatus, Redemption, RedemptionId, RedemptionStatus, Result, Reward, RewardId,
    TallyError, Task, TaskId, User, UserId,
};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct Inner {
    seq: u64,
    users: HashMap<u64, User>,
    tasks: HashMap<u64, Task>,
    assignments: HashMap<u64, Assignment>,
    completions: HashMap<u64, Completion>,
    rewards: HashMap<u64, Reward>,
    redemptions: HashMap<u64, Redemption>,
    proposals: HashMap<u64, Proposal>,
    bonuses: HashMap<u64, Bonus>,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

/// In-memory reference backend.
///
/// `begin_transaction` snapshots the entire state; `rollback_transaction`
/// restores it wholesale, so a failed multi-row operation leaves no partial
/// writes behind. Suitable for the single-household, low-QPS domain and for
/// tests; a durable backend implements the same trait.
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
    backup: Arc<RwLock<Option<Inner>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            backup: Arc::new(RwLock::new(None)),
        }
    }
}

#[async_trait]
impl ChoreStore for MemoryStore {
    async fn begin_transaction(&self) -> Result<()> {
        let mut backup = self.backup.write().await;
        if backup.is_some() {
            return Err(TallyError::Storage(
                "transaction already in progress".to_string(),
            ));
        }
        let inner = self.inner.read().await;
        *backup = Some(inner.clone());
        debug!("transaction started");
        Ok(())
    }

    async fn commit_transaction(&self) -> Result<()> {
        let mut backup = self.backup.write().await;
        if backup.take().is_none() {
            return Err(TallyError::Storage("no transaction in progress".to_string()));
        }
        debug!("transaction committed");
        Ok(())
    }

    async fn rollback_transaction(&self) -> Result<()> {
        let mut backup = self.backup.write().await;
        match backup.take() {
            Some(snapshot) => {
                let mut inner = self.inner.write().await;
                *inner = snapshot;
                debug!("transaction rolled back");
                Ok(())
            }
            None => Err(TallyError::Storage("no transaction in progress".to_string())),
        }
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let user = User {
            id: UserId::new(id),
            name: user.name,
            role: user.role,
            balance: user.balance,
            active: user.active,
            created_at: Utc::now(),
        };
        inner.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id.as_u64()).cloned())
    }

    async fn put_user(&self, user: User) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.users.insert(user.id.as_u64(), user);
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let inner = self.inner.read().await;
        let mut users: Vec<_> = inner.users.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn insert_task(&self, task: NewTask) -> Result<Task> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let now = Utc::now();
        let task = Task {
            id: TaskId::new(id),
            title: task.title,
            description: task.description,
            task_type: task.task_type,
            frequency: task.frequency,
            base_value: task.base_value,
            status: tally_types::TaskStatus::Active,
            created_by: task.created_by,
            created_at: now,
            updated_at: now,
        };
        inner.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        let inner = self.inner.read().await;
        Ok(inner.tasks.get(&id.as_u64()).cloned())
    }

    async fn put_task(&self, task: Task) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.tasks.insert(task.id.as_u64(), task);
        Ok(())
    }

    async fn list_tasks(&self) -> Result<Vec<Task>> {
        let inner = self.inner.read().await;
        let mut tasks: Vec<_> = inner.tasks.values().cloned().collect();
        tasks.sort_by_key(|t| t.id);
        Ok(tasks)
    }

    async fn insert_assignment(&self, assignment: NewAssignment) -> Result<Assignment> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let assignment = Assignment {
            id: AssignmentId::new(id),
            task_id: assignment.task_id,
            user_id: assignment.user_id,
            assigned_date: assignment.assigned_date,
            completed: false,
            validated: false,
            cancelled: false,
            cancelled_at: None,
            assigned_by: assignment.assigned_by,
            created_at: Utc::now(),
        };
        inner.assignments.insert(id, assignment.clone());
        Ok(assignment)
    }

    async fn get_assignment(&self, id: AssignmentId) -> Result<Option<Assignment>> {
        let inner = self.inner.read().await;
        Ok(inner.assignments.get(&id.as_u64()).cloned())
    }

    async fn put_assignment(&self, assignment: Assignment) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.assignments.insert(assignment.id.as_u64(), assignment);
        Ok(())
    }

    async fn find_assignment(
        &self,
        task: TaskId,
        user: UserId,
        date: NaiveDate,
    ) -> Result<Option<Assignment>> {
        let inner = self.inner.read().await;
        Ok(inner
            .assignments
            .values()
            .find(|a| a.task_id == task && a.user_id == user && a.assigned_date == date)
            .cloned())
    }

    async fn assignments_for_user_in_range(
        &self,
        user: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Assignment>> {
        let inner = self.inner.read().await;
        let mut assignments: Vec<_> = inner
            .assignments
            .values()
            .filter(|a| a.user_id == user && a.assigned_date >= start && a.assigned_date <= end)
            .cloned()
            .collect();
        assignments.sort_by_key(|a| (a.assigned_date, a.id));
        Ok(assignments)
    }

    async fn cancelled_assignments(&self) -> Result<Vec<Assignment>> {
        let inner = self.inner.read().await;
        let mut assignments: Vec<_> = inner
            .assignments
            .values()
            .filter(|a| a.cancelled)
            .cloned()
            .collect();
        assignments.sort_by(|a, b| b.cancelled_at.cmp(&a.cancelled_at));
        Ok(assignments)
    }

    async fn insert_completion(&self, completion: NewCompletion) -> Result<Completion> {
        let mut inner = self.inner.write().await;
        if inner
            .completions
            .values()
            .any(|c| c.assignment_id == completion.assignment_id)
        {
            return Err(TallyError::Conflict(format!(
                "assignment {} already has a completion",
                completion.assignment_id
            )));
        }
        let id = inner.next_id();
        let completion = Completion {
            id: CompletionId::new(id),
            assignment_id: completion.assignment_id,
            task_id: completion.task_id,
            user_id: completion.user_id,
            completed_at: completion.completed_at,
            notes: completion.notes,
            validation_score: None,
            validated_by: None,
            validated_at: None,
            validation_notes: None,
            credits_awarded: 0,
        };
        inner.completions.insert(id, completion.clone());
        Ok(completion)
    }

    async fn get_completion(&self, id: CompletionId) -> Result<Option<Completion>> {
        let inner = self.inner.read().await;
        Ok(inner.completions.get(&id.as_u64()).cloned())
    }

    async fn put_completion(&self, completion: Completion) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.completions.insert(completion.id.as_u64(), completion);
        Ok(())
    }

    async fn delete_completion(&self, id: CompletionId) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.completions.remove(&id.as_u64());
        Ok(())
    }

    async fn completion_for_assignment(
        &self,
        assignment: AssignmentId,
    ) -> Result<Option<Completion>> {
        let inner = self.inner.read().await;
        Ok(inner
            .completions
            .values()
            .find(|c| c.assignment_id == assignment)
            .cloned())
    }

    async fn pending_validations(&self) -> Result<Vec<Completion>> {
        let inner = self.inner.read().await;
        let mut completions: Vec<_> = inner
            .completions
            .values()
            .filter(|c| c.validation_score.is_none())
            .cloned()
            .collect();
        completions.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(completions)
    }

    async fn insert_reward(&self, reward: NewReward) -> Result<Reward> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let now = Utc::now();
        let reward = Reward {
            id: RewardId::new(id),
            name: reward.name,
            description: reward.description,
            credit_cost: reward.credit_cost,
            stock: reward.stock,
            active: true,
            created_by: reward.created_by,
            created_at: now,
            updated_at: now,
        };
        inner.rewards.insert(id, reward.clone());
        Ok(reward)
    }

    async fn get_reward(&self, id: RewardId) -> Result<Option<Reward>> {
        let inner = self.inner.read().await;
        Ok(inner.rewards.get(&id.as_u64()).cloned())
    }

    async fn put_reward(&self, reward: Reward) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.rewards.insert(reward.id.as_u64(), reward);
        Ok(())
    }

    async fn list_rewards(&self) -> Result<Vec<Reward>> {
        let inner = self.inner.read().await;
        let mut rewards: Vec<_> = inner.rewards.values().cloned().collect();
        rewards.sort_by_key(|r| r.id);
        Ok(rewards)
    }

    async fn insert_redemption(&self, redemption: NewRedemption) -> Result<Redemption> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let redemption = Redemption {
            id: RedemptionId::new(id),
            reward_id: redemption.reward_id,
            user_id: redemption.user_id,
            credits_spent: redemption.credits_spent,
            status: RedemptionStatus::Pending,
            requested_at: Utc::now(),
            notes: redemption.notes,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
        };
        inner.redemptions.insert(id, redemption.clone());
        Ok(redemption)
    }

    async fn get_redemption(&self, id: RedemptionId) -> Result<Option<Redemption>> {
        let inner = self.inner.read().await;
        Ok(inner.redemptions.get(&id.as_u64()).cloned())
    }

    async fn put_redemption(&self, redemption: Redemption) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.redemptions.insert(redemption.id.as_u64(), redemption);
        Ok(())
    }

    async fn pending_redemptions_for_user(&self, user: UserId) -> Result<Vec<Redemption>> {
        let inner = self.inner.read().await;
        let mut redemptions: Vec<_> = inner
            .redemptions
            .values()
            .filter(|r| r.user_id == user && r.status == RedemptionStatus::Pending)
            .cloned()
            .collect();
        redemptions.sort_by_key(|r| r.id);
        Ok(redemptions)
    }

    async fn pending_redemption_count_for_reward(&self, reward: RewardId) -> Result<i64> {
        let inner = self.inner.read().await;
        Ok(inner
            .redemptions
            .values()
            .filter(|r| r.reward_id == reward && r.status == RedemptionStatus::Pending)
            .count() as i64)
    }

    async fn redemptions_for_user(&self, user: UserId) -> Result<Vec<Redemption>> {
        let inner = self.inner.read().await;
        let mut redemptions: Vec<_> = inner
            .redemptions
            .values()
            .filter(|r| r.user_id == user)
            .cloned()
            .collect();
        redemptions.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(redemptions)
    }

    async fn list_redemptions(&self) -> Result<Vec<Redemption>> {
        let inner = self.inner.read().await;
        let mut redemptions: Vec<_> = inner.redemptions.values().cloned().collect();
        redemptions.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(redemptions)
    }

    async fn insert_proposal(&self, proposal: NewProposal) -> Result<Proposal> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let proposal = Proposal {
            id: ProposalId::new(id),
            user_id: proposal.user_id,
            title: proposal.title,
            description: proposal.description,
            frequency: proposal.frequency,
            suggested_reward: proposal.suggested_reward,
            message_to_admin: proposal.message_to_admin,
            status: ProposalStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            admin_notes: None,
            final_title: None,
            final_description: None,
            final_reward: None,
            created_task: None,
            created_at: Utc::now(),
        };
        inner.proposals.insert(id, proposal.clone());
        Ok(proposal)
    }

    async fn get_proposal(&self, id: ProposalId) -> Result<Option<Proposal>> {
        let inner = self.inner.read().await;
        Ok(inner.proposals.get(&id.as_u64()).cloned())
    }

    async fn put_proposal(&self, proposal: Proposal) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.proposals.insert(proposal.id.as_u64(), proposal);
        Ok(())
    }

    async fn proposals_for_user(&self, user: UserId) -> Result<Vec<Proposal>> {
        let inner = self.inner.read().await;
        let mut proposals: Vec<_> = inner
            .proposals
            .values()
            .filter(|p| p.user_id == user)
            .cloned()
            .collect();
        proposals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(proposals)
    }

    async fn list_proposals(&self) -> Result<Vec<Proposal>> {
        let inner = self.inner.read().await;
        let mut proposals: Vec<_> = inner.proposals.values().cloned().collect();
        proposals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(proposals)
    }

    async fn insert_bonus(&self, bonus: NewBonus) -> Result<Bonus> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let bonus = Bonus {
            id: BonusId::new(id),
            user_id: bonus.user_id,
            credits: bonus.credits,
            description: bonus.description,
            granted_by: bonus.granted_by,
            created_at: Utc::now(),
        };
        inner.bonuses.insert(id, bonus.clone());
        Ok(bonus)
    }

    async fn bonuses_for_user(&self, user: UserId) -> Result<Vec<Bonus>> {
        let inner = self.inner.read().await;
        let mut bonuses: Vec<_> = inner
            .bonuses
            .values()
            .filter(|b| b.user_id == user)
            .cloned()
            .collect();
        bonuses.sort_by_key(|b| b.id);
        Ok(bonuses)
    }
}
