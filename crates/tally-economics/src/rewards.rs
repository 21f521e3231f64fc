use crate::ledger::Ledger;
use chrono::Utc;
use std::sync::Arc;
use tally_store::ChoreStore;
use tally_types::{
    Actor, NewRedemption, NewReward, Redemption, RedemptionId, RedemptionStatus, Result, Reward,
    RewardId, TallyError,
};
use tracing::{info, warn};

/// Fields for a new reward; the acting admin becomes `created_by`.
#[derive(Debug, Clone)]
pub struct RewardSpec {
    pub name: String,
    pub description: String,
    pub credit_cost: i64,
    pub stock: Option<i64>,
}

/// Partial update for a reward. The outer Option means "leave unchanged";
/// for `stock`, the inner Option distinguishes a finite count from
/// unlimited.
#[derive(Debug, Clone, Default)]
pub struct RewardUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub credit_cost: Option<i64>,
    pub stock: Option<Option<i64>>,
    pub active: Option<bool>,
}

/// Reward catalog plus the redemption request lifecycle.
///
/// A pending redemption reserves credits and stock without mutating either;
/// the deduction and the stock decrement happen only on approval, inside
/// one transaction.
pub struct RewardManager {
    store: Arc<dyn ChoreStore>,
    ledger: Arc<Ledger>,
}

impl RewardManager {
    pub fn new(store: Arc<dyn ChoreStore>, ledger: Arc<Ledger>) -> Self {
        Self { store, ledger }
    }

    pub async fn create_reward(&self, actor: &Actor, spec: RewardSpec) -> Result<Reward> {
        actor.ensure_admin()?;
        let reward = self
            .store
            .insert_reward(NewReward {
                name: spec.name,
                description: spec.description,
                credit_cost: spec.credit_cost,
                stock: spec.stock,
                created_by: actor.user_id,
            })
            .await?;
        info!(reward = %reward.id, cost = reward.credit_cost, "🎁 Reward created");
        Ok(reward)
    }

    pub async fn update_reward(
        &self,
        actor: &Actor,
        id: RewardId,
        update: RewardUpdate,
    ) -> Result<Reward> {
        actor.ensure_admin()?;
        let mut reward = self.reward(id).await?;

        if let Some(name) = update.name {
            reward.name = name;
        }
        if let Some(description) = update.description {
            reward.description = description;
        }
        if let Some(credit_cost) = update.credit_cost {
            reward.credit_cost = credit_cost;
        }
        if let Some(stock) = update.stock {
            reward.stock = stock;
        }
        if let Some(active) = update.active {
            reward.active = active;
        }
        reward.updated_at = Utc::now();

        self.store.put_reward(reward.clone()).await?;
        Ok(reward)
    }

    /// Soft delete: the reward disappears from member listings but keeps
    /// its redemption history.
    pub async fn deactivate_reward(&self, actor: &Actor, id: RewardId) -> Result<Reward> {
        actor.ensure_admin()?;
        let mut reward = self.reward(id).await?;
        reward.active = false;
        reward.updated_at = Utc::now();
        self.store.put_reward(reward.clone()).await?;
        info!(reward = %id, "🎁 Reward deactivated");
        Ok(reward)
    }

    pub async fn reward(&self, id: RewardId) -> Result<Reward> {
        self.store
            .get_reward(id)
            .await?
            .ok_or_else(|| TallyError::not_found("reward", id))
    }

    /// Admins see the full catalog, members only active rewards.
    pub async fn list(&self, actor: &Actor) -> Result<Vec<Reward>> {
        let rewards = self.store.list_rewards().await?;
        if actor.role.is_admin() {
            Ok(rewards)
        } else {
            Ok(rewards.into_iter().filter(|r| r.active).collect())
        }
    }

    /// Stock still open to new requests: finite stock minus pending
    /// redemptions, or None when unlimited.
    pub async fn available_stock(&self, id: RewardId) -> Result<Option<i64>> {
        let reward = self.reward(id).await?;
        match reward.stock {
            None => Ok(None),
            Some(stock) => {
                let pending = self.store.pending_redemption_count_for_reward(id).await?;
                Ok(Some(stock - pending))
            }
        }
    }

    /// Requests a redemption. Checks run against *available* credits and
    /// *available* stock, so pending requests already count; on success the
    /// redemption is recorded as pending with no balance or stock change.
    pub async fn redeem(
        &self,
        actor: &Actor,
        reward_id: RewardId,
        notes: Option<String>,
    ) -> Result<Redemption> {
        let reward = self.reward(reward_id).await?;

        if !reward.active {
            return Err(TallyError::Unavailable { reward: reward_id });
        }

        if let Some(available) = self.available_stock(reward_id).await? {
            if available <= 0 {
                return Err(TallyError::OutOfStock { reward: reward_id });
            }
        }

        let available = self.ledger.available_credits(actor.user_id).await?;
        if available < reward.credit_cost {
            return Err(TallyError::InsufficientCredits {
                required: reward.credit_cost,
                available,
            });
        }

        let redemption = self
            .store
            .insert_redemption(NewRedemption {
                reward_id,
                user_id: actor.user_id,
                credits_spent: reward.credit_cost,
                notes,
            })
            .await?;

        info!(
            redemption = %redemption.id,
            reward = %reward_id,
            user = %actor.user_id,
            reserved = reward.credit_cost,
            "🛒 Redemption requested"
        );
        Ok(redemption)
    }

    /// Approves a pending redemption: deducts the reserved credits, burns
    /// one unit of finite stock, and stamps the approver. Status and
    /// balance are re-checked on the rows read inside the transaction.
    pub async fn approve(&self, actor: &Actor, id: RedemptionId) -> Result<Redemption> {
        actor.ensure_admin()?;

        self.store.begin_transaction().await?;
        match self.approve_inner(actor, id).await {
            Ok(redemption) => {
                self.store.commit_transaction().await?;
                info!(
                    redemption = %id,
                    user = %redemption.user_id,
                    spent = redemption.credits_spent,
                    "✅ Redemption approved"
                );
                Ok(redemption)
            }
            Err(e) => {
                warn!(redemption = %id, error = %e, "❌ Redemption approval rolled back");
                self.store.rollback_transaction().await?;
                Err(e)
            }
        }
    }

    async fn approve_inner(&self, actor: &Actor, id: RedemptionId) -> Result<Redemption> {
        let mut redemption = self
            .store
            .get_redemption(id)
            .await?
            .ok_or_else(|| TallyError::not_found("redemption", id))?;

        if redemption.status != RedemptionStatus::Pending {
            return Err(TallyError::conflict(format!(
                "redemption {} already processed",
                id
            )));
        }

        // The balance may have moved since the request was made.
        let balance = self.ledger.balance(redemption.user_id).await?;
        if balance < redemption.credits_spent {
            return Err(TallyError::InsufficientCredits {
                required: redemption.credits_spent,
                available: balance,
            });
        }

        self.ledger
            .apply_delta(redemption.user_id, -redemption.credits_spent)
            .await?;

        let mut reward = self.reward(redemption.reward_id).await?;
        if let Some(stock) = reward.stock {
            reward.stock = Some(stock - 1);
            reward.updated_at = Utc::now();
            self.store.put_reward(reward).await?;
        }

        redemption.status = RedemptionStatus::Approved;
        redemption.approved_by = Some(actor.user_id);
        redemption.approved_at = Some(Utc::now());
        self.store.put_redemption(redemption.clone()).await?;

        Ok(redemption)
    }

    /// Rejects a pending redemption. Nothing was ever committed, so no
    /// balance or stock change is needed.
    pub async fn reject(
        &self,
        actor: &Actor,
        id: RedemptionId,
        reason: Option<String>,
    ) -> Result<Redemption> {
        actor.ensure_admin()?;

        let mut redemption = self
            .store
            .get_redemption(id)
            .await?
            .ok_or_else(|| TallyError::not_found("redemption", id))?;

        if redemption.status != RedemptionStatus::Pending {
            return Err(TallyError::conflict(format!(
                "redemption {} already processed",
                id
            )));
        }

        redemption.status = RedemptionStatus::Rejected;
        redemption.rejection_reason = reason;
        self.store.put_redemption(redemption.clone()).await?;

        info!(redemption = %id, user = %redemption.user_id, "🚫 Redemption rejected");
        Ok(redemption)
    }

    /// Redemption history: admins see all, members their own.
    pub async fn redemptions(&self, actor: &Actor) -> Result<Vec<Redemption>> {
        if actor.role.is_admin() {
            self.store.list_redemptions().await
        } else {
            self.store.redemptions_for_user(actor.user_id).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_store::MemoryStore;
    use tally_types::{NewUser, Role};

    struct Fixture {
        manager: RewardManager,
        ledger: Arc<Ledger>,
        admin: Actor,
        member: Actor,
    }

    async fn setup(balance: i64) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let admin = store
            .insert_user(NewUser::new("admin", Role::Admin))
            .await
            .unwrap();
        let mut member = NewUser::new("ana", Role::Member);
        member.balance = balance;
        let member = store.insert_user(member).await.unwrap();

        let ledger = Arc::new(Ledger::new(store.clone()));
        let manager = RewardManager::new(store, ledger.clone());
        Fixture {
            manager,
            ledger,
            admin: Actor::admin(admin.id),
            member: Actor::member(member.id),
        }
    }

    fn spec(cost: i64, stock: Option<i64>) -> RewardSpec {
        RewardSpec {
            name: "cinema night".to_string(),
            description: String::new(),
            credit_cost: cost,
            stock,
        }
    }

    #[tokio::test]
    async fn test_redeem_reserves_without_mutation() {
        let f = setup(100).await;
        let reward = f.manager.create_reward(&f.admin, spec(30, Some(2))).await.unwrap();

        let redemption = f.manager.redeem(&f.member, reward.id, None).await.unwrap();
        assert_eq!(redemption.status, RedemptionStatus::Pending);

        // Balance and stored stock untouched; availability shrinks.
        assert_eq!(f.ledger.balance(f.member.user_id).await.unwrap(), 100);
        assert_eq!(f.manager.reward(reward.id).await.unwrap().stock, Some(2));
        assert_eq!(
            f.manager.available_stock(reward.id).await.unwrap(),
            Some(1)
        );
        assert_eq!(
            f.ledger.available_credits(f.member.user_id).await.unwrap(),
            70
        );
    }

    #[tokio::test]
    async fn test_redeem_checks_available_not_balance() {
        let f = setup(100).await;
        let reward = f.manager.create_reward(&f.admin, spec(60, None)).await.unwrap();

        f.manager.redeem(&f.member, reward.id, None).await.unwrap();
        // Balance (100) still covers the cost, but 60 are reserved.
        let err = f.manager.redeem(&f.member, reward.id, None).await;
        assert!(matches!(
            err,
            Err(TallyError::InsufficientCredits {
                required: 60,
                available: 40
            })
        ));
    }

    #[tokio::test]
    async fn test_pending_requests_consume_stock() {
        let f = setup(1000).await;
        let reward = f.manager.create_reward(&f.admin, spec(10, Some(1))).await.unwrap();

        f.manager.redeem(&f.member, reward.id, None).await.unwrap();
        assert!(matches!(
            f.manager.redeem(&f.member, reward.id, None).await,
            Err(TallyError::OutOfStock { .. })
        ));
    }

    #[tokio::test]
    async fn test_inactive_reward_unavailable() {
        let f = setup(100).await;
        let reward = f.manager.create_reward(&f.admin, spec(10, None)).await.unwrap();
        f.manager.deactivate_reward(&f.admin, reward.id).await.unwrap();

        assert!(matches!(
            f.manager.redeem(&f.member, reward.id, None).await,
            Err(TallyError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_approve_deducts_and_decrements() {
        let f = setup(100).await;
        let reward = f.manager.create_reward(&f.admin, spec(30, Some(2))).await.unwrap();
        let redemption = f.manager.redeem(&f.member, reward.id, None).await.unwrap();

        let approved = f.manager.approve(&f.admin, redemption.id).await.unwrap();
        assert_eq!(approved.status, RedemptionStatus::Approved);
        assert_eq!(approved.approved_by, Some(f.admin.user_id));

        assert_eq!(f.ledger.balance(f.member.user_id).await.unwrap(), 70);
        assert_eq!(f.manager.reward(reward.id).await.unwrap().stock, Some(1));
    }

    #[tokio::test]
    async fn test_double_approve_conflicts_without_side_effects() {
        let f = setup(100).await;
        let reward = f.manager.create_reward(&f.admin, spec(30, Some(2))).await.unwrap();
        let redemption = f.manager.redeem(&f.member, reward.id, None).await.unwrap();
        f.manager.approve(&f.admin, redemption.id).await.unwrap();

        assert!(matches!(
            f.manager.approve(&f.admin, redemption.id).await,
            Err(TallyError::Conflict(_))
        ));
        assert_eq!(f.ledger.balance(f.member.user_id).await.unwrap(), 70);
        assert_eq!(f.manager.reward(reward.id).await.unwrap().stock, Some(1));
    }

    #[tokio::test]
    async fn test_approve_rechecks_balance() {
        let f = setup(50).await;
        let reward = f.manager.create_reward(&f.admin, spec(50, None)).await.unwrap();
        let redemption = f.manager.redeem(&f.member, reward.id, None).await.unwrap();

        // Balance drained between request and approval.
        f.ledger.apply_delta(f.member.user_id, -20).await.unwrap();

        assert!(matches!(
            f.manager.approve(&f.admin, redemption.id).await,
            Err(TallyError::InsufficientCredits { .. })
        ));
        // Rolled back: still pending, balance unchanged.
        assert_eq!(f.ledger.balance(f.member.user_id).await.unwrap(), 30);
        let row = f
            .manager
            .redemptions(&f.admin)
            .await
            .unwrap()
            .into_iter()
            .find(|r| r.id == redemption.id)
            .unwrap();
        assert_eq!(row.status, RedemptionStatus::Pending);
    }

    #[tokio::test]
    async fn test_reject_releases_reservation() {
        let f = setup(100).await;
        let reward = f.manager.create_reward(&f.admin, spec(40, Some(1))).await.unwrap();
        let redemption = f.manager.redeem(&f.member, reward.id, None).await.unwrap();

        let rejected = f
            .manager
            .reject(&f.admin, redemption.id, Some("not this week".to_string()))
            .await
            .unwrap();
        assert_eq!(rejected.status, RedemptionStatus::Rejected);

        // No mutation ever happened; reservation is gone.
        assert_eq!(f.ledger.balance(f.member.user_id).await.unwrap(), 100);
        assert_eq!(f.manager.reward(reward.id).await.unwrap().stock, Some(1));
        assert_eq!(
            f.manager.available_stock(reward.id).await.unwrap(),
            Some(1)
        );
        assert_eq!(
            f.ledger.available_credits(f.member.user_id).await.unwrap(),
            100
        );
    }

    #[tokio::test]
    async fn test_member_cannot_approve() {
        let f = setup(100).await;
        let reward = f.manager.create_reward(&f.admin, spec(10, None)).await.unwrap();
        let redemption = f.manager.redeem(&f.member, reward.id, None).await.unwrap();

        assert!(matches!(
            f.manager.approve(&f.member, redemption.id).await,
            Err(TallyError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_member_listing_hides_inactive() {
        let f = setup(100).await;
        let active = f.manager.create_reward(&f.admin, spec(10, None)).await.unwrap();
        let hidden = f.manager.create_reward(&f.admin, spec(20, None)).await.unwrap();
        f.manager.deactivate_reward(&f.admin, hidden.id).await.unwrap();

        let member_view = f.manager.list(&f.member).await.unwrap();
        assert_eq!(member_view.len(), 1);
        assert_eq!(member_view[0].id, active.id);

        assert_eq!(f.manager.list(&f.admin).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_reward() {
        let f = setup(100).await;
        assert!(matches!(
            f.manager.redeem(&f.member, RewardId::new(404), None).await,
            Err(TallyError::NotFound { .. })
        ));
    }
}
