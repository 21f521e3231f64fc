use std::sync::Arc;
use tally_store::ChoreStore;
use tally_types::{Result, TallyError, UserId};
use tracing::info;

/// Applies signed credit deltas to user balances.
///
/// Balances have no floor and may go negative (a cancelled mandatory task
/// can push a user below zero). The caller is responsible for running
/// ledger mutations inside the transaction that also flips the flags they
/// pay for.
pub struct Ledger {
    store: Arc<dyn ChoreStore>,
}

impl Ledger {
    pub fn new(store: Arc<dyn ChoreStore>) -> Self {
        Self { store }
    }

    /// Authoritative balance, read from the store on every call.
    pub async fn balance(&self, user: UserId) -> Result<i64> {
        let record = self
            .store
            .get_user(user)
            .await?
            .ok_or_else(|| TallyError::not_found("user", user))?;
        Ok(record.balance)
    }

    /// Adds `delta` (any sign) to the user's balance and returns the new
    /// balance. A zero delta is a no-op.
    pub async fn apply_delta(&self, user: UserId, delta: i64) -> Result<i64> {
        let mut record = self
            .store
            .get_user(user)
            .await?
            .ok_or_else(|| TallyError::not_found("user", user))?;
        if delta == 0 {
            return Ok(record.balance);
        }

        let balance_before = record.balance;
        record.balance += delta;
        let balance_after = record.balance;
        self.store.put_user(record).await?;

        info!(
            user = %user,
            delta,
            balance_before,
            balance_after,
            "💰 Balance updated"
        );
        Ok(balance_after)
    }

    /// Credits the user can still commit to: balance minus everything
    /// reserved by their pending redemptions. Computed on demand, never
    /// stored.
    pub async fn available_credits(&self, user: UserId) -> Result<i64> {
        let balance = self.balance(user).await?;
        let pending = self.store.pending_redemptions_for_user(user).await?;
        let reserved: i64 = pending.iter().map(|r| r.credits_spent).sum();
        Ok(balance - reserved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_store::MemoryStore;
    use tally_types::{NewRedemption, NewReward, NewUser, Role};

    async fn setup() -> (Arc<MemoryStore>, Ledger, UserId) {
        let store = Arc::new(MemoryStore::new());
        let user = store
            .insert_user(NewUser::new("ana", Role::Member))
            .await
            .unwrap();
        let ledger = Ledger::new(store.clone());
        (store, ledger, user.id)
    }

    #[tokio::test]
    async fn test_delta_may_go_negative() {
        let (_store, ledger, user) = setup().await;
        assert_eq!(ledger.apply_delta(user, -40).await.unwrap(), -40);
        assert_eq!(ledger.balance(user).await.unwrap(), -40);
        assert_eq!(ledger.apply_delta(user, 100).await.unwrap(), 60);
    }

    #[tokio::test]
    async fn test_zero_delta_is_noop() {
        let (_store, ledger, user) = setup().await;
        ledger.apply_delta(user, 25).await.unwrap();
        assert_eq!(ledger.apply_delta(user, 0).await.unwrap(), 25);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let (_store, ledger, _user) = setup().await;
        assert!(matches!(
            ledger.apply_delta(UserId::new(999), 10).await,
            Err(TallyError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_available_credits_subtracts_pending() {
        let (store, ledger, user) = setup().await;
        ledger.apply_delta(user, 100).await.unwrap();

        let reward = store
            .insert_reward(NewReward {
                name: "cinema".to_string(),
                description: String::new(),
                credit_cost: 30,
                stock: None,
                created_by: user,
            })
            .await
            .unwrap();
        store
            .insert_redemption(NewRedemption {
                reward_id: reward.id,
                user_id: user,
                credits_spent: 30,
                notes: None,
            })
            .await
            .unwrap();

        assert_eq!(ledger.balance(user).await.unwrap(), 100);
        assert_eq!(ledger.available_credits(user).await.unwrap(), 70);
    }
}
