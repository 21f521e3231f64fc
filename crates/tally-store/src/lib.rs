pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use tally_types::{
    Assignment, AssignmentId, Bonus, Completion, CompletionId, NewAssignment, NewBonus,
    NewCompletion, NewProposal, NewRedemption, NewReward, NewTask, NewUser, Proposal, ProposalId,
    Redemption, RedemptionId, Result, Reward, RewardId, Task, TaskId, User, UserId,
};

/// Transactional store for all chore-economy entities.
///
/// The store is the single source of truth: managers never cache balances or
/// flags across calls. `insert_*` methods assign ids from a monotonic
/// sequence and stamp creation timestamps; `put_*` methods replace the whole
/// record. Missing rows are `Ok(None)` from `get_*` — mapping to `NotFound`
/// is the caller's concern.
///
/// State-changing operations that touch more than one row run between
/// `begin_transaction` and `commit_transaction`; `rollback_transaction`
/// restores the state captured at begin. Transactions do not nest.
#[async_trait]
pub trait ChoreStore: Send + Sync {
    async fn begin_transaction(&self) -> Result<()>;
    async fn commit_transaction(&self) -> Result<()>;
    async fn rollback_transaction(&self) -> Result<()>;

    // Users
    async fn insert_user(&self, user: NewUser) -> Result<User>;
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;
    async fn put_user(&self, user: User) -> Result<()>;
    async fn list_users(&self) -> Result<Vec<User>>;

    // Tasks
    async fn insert_task(&self, task: NewTask) -> Result<Task>;
    async fn get_task(&self, id: TaskId) -> Result<Option<Task>>;
    async fn put_task(&self, task: Task) -> Result<()>;
    async fn list_tasks(&self) -> Result<Vec<Task>>;

    // Assignments
    async fn insert_assignment(&self, assignment: NewAssignment) -> Result<Assignment>;
    async fn get_assignment(&self, id: AssignmentId) -> Result<Option<Assignment>>;
    async fn put_assignment(&self, assignment: Assignment) -> Result<()>;
    /// Dedup probe for single and bulk assignment.
    async fn find_assignment(
        &self,
        task: TaskId,
        user: UserId,
        date: NaiveDate,
    ) -> Result<Option<Assignment>>;
    async fn assignments_for_user_in_range(
        &self,
        user: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Assignment>>;
    /// Cancelled assignments, most recently cancelled first.
    async fn cancelled_assignments(&self) -> Result<Vec<Assignment>>;

    // Completions
    /// Inserts a completion; fails with `Conflict` if the assignment
    /// already has a live one.
    async fn insert_completion(&self, completion: NewCompletion) -> Result<Completion>;
    async fn get_completion(&self, id: CompletionId) -> Result<Option<Completion>>;
    async fn put_completion(&self, completion: Completion) -> Result<()>;
    async fn delete_completion(&self, id: CompletionId) -> Result<()>;
    async fn completion_for_assignment(
        &self,
        assignment: AssignmentId,
    ) -> Result<Option<Completion>>;
    /// Unvalidated completions, most recently completed first.
    async fn pending_validations(&self) -> Result<Vec<Completion>>;

    // Rewards
    async fn insert_reward(&self, reward: NewReward) -> Result<Reward>;
    async fn get_reward(&self, id: RewardId) -> Result<Option<Reward>>;
    async fn put_reward(&self, reward: Reward) -> Result<()>;
    async fn list_rewards(&self) -> Result<Vec<Reward>>;

    // Redemptions
    /// Inserts a redemption in pending status.
    async fn insert_redemption(&self, redemption: NewRedemption) -> Result<Redemption>;
    async fn get_redemption(&self, id: RedemptionId) -> Result<Option<Redemption>>;
    async fn put_redemption(&self, redemption: Redemption) -> Result<()>;
    async fn pending_redemptions_for_user(&self, user: UserId) -> Result<Vec<Redemption>>;
    async fn pending_redemption_count_for_reward(&self, reward: RewardId) -> Result<i64>;
    /// A user's redemptions, most recent first.
    async fn redemptions_for_user(&self, user: UserId) -> Result<Vec<Redemption>>;
    async fn list_redemptions(&self) -> Result<Vec<Redemption>>;

    // Proposals
    /// Inserts a proposal in pending status.
    async fn insert_proposal(&self, proposal: NewProposal) -> Result<Proposal>;
    async fn get_proposal(&self, id: ProposalId) -> Result<Option<Proposal>>;
    async fn put_proposal(&self, proposal: Proposal) -> Result<()>;
    /// A user's proposals, most recent first.
    async fn proposals_for_user(&self, user: UserId) -> Result<Vec<Proposal>>;
    async fn list_proposals(&self) -> Result<Vec<Proposal>>;

    // Bonuses
    async fn insert_bonus(&self, bonus: NewBonus) -> Result<Bonus>;
    async fn bonuses_for_user(&self, user: UserId) -> Result<Vec<Bonus>>;
}
