use crate::ledger::Ledger;
use std::sync::Arc;
use tally_store::ChoreStore;
use tally_types::{Actor, Bonus, NewBonus, Result, TallyError, UserId};
use tracing::{info, warn};

/// Out-of-band credit adjustments: an admin grants (or docks) credits with
/// a free-text reason. The audit record and the ledger mutation commit
/// together; bonuses are never reversed.
pub struct BonusManager {
    store: Arc<dyn ChoreStore>,
    ledger: Arc<Ledger>,
}

impl BonusManager {
    pub fn new(store: Arc<dyn ChoreStore>, ledger: Arc<Ledger>) -> Self {
        Self { store, ledger }
    }

    pub async fn grant(
        &self,
        actor: &Actor,
        user: UserId,
        credits: i64,
        description: impl Into<String>,
    ) -> Result<Bonus> {
        actor.ensure_admin()?;
        if credits == 0 {
            return Err(TallyError::invalid("bonus credits must be nonzero"));
        }
        self.store
            .get_user(user)
            .await?
            .ok_or_else(|| TallyError::not_found("user", user))?;

        let description = description.into();
        self.store.begin_transaction().await?;
        let result: Result<Bonus> = async {
            let bonus = self
                .store
                .insert_bonus(NewBonus {
                    user_id: user,
                    credits,
                    description,
                    granted_by: actor.user_id,
                })
                .await?;
            self.ledger.apply_delta(user, credits).await?;
            Ok(bonus)
        }
        .await;

        match result {
            Ok(bonus) => {
                self.store.commit_transaction().await?;
                info!(bonus = %bonus.id, user = %user, credits, "🎖️ Bonus granted");
                Ok(bonus)
            }
            Err(e) => {
                warn!(user = %user, error = %e, "❌ Bonus grant rolled back");
                self.store.rollback_transaction().await?;
                Err(e)
            }
        }
    }

    pub async fn bonuses_for_user(&self, actor: &Actor, user: UserId) -> Result<Vec<Bonus>> {
        actor.ensure_self_or_admin(user)?;
        self.store.bonuses_for_user(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_store::MemoryStore;
    use tally_types::{NewUser, Role};

    async fn setup() -> (BonusManager, Arc<Ledger>, Actor, UserId) {
        let store = Arc::new(MemoryStore::new());
        let admin = store
            .insert_user(NewUser::new("admin", Role::Admin))
            .await
            .unwrap();
        let member = store
            .insert_user(NewUser::new("ana", Role::Member))
            .await
            .unwrap();
        let ledger = Arc::new(Ledger::new(store.clone()));
        let manager = BonusManager::new(store, ledger.clone());
        (manager, ledger, Actor::admin(admin.id), member.id)
    }

    #[tokio::test]
    async fn test_grant_pairs_record_and_delta() {
        let (manager, ledger, admin, user) = setup().await;
        let bonus = manager.grant(&admin, user, 50, "helped cook").await.unwrap();
        assert_eq!(bonus.credits, 50);
        assert_eq!(ledger.balance(user).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_negative_grant_docks_credits() {
        let (manager, ledger, admin, user) = setup().await;
        manager.grant(&admin, user, -25, "broken window").await.unwrap();
        assert_eq!(ledger.balance(user).await.unwrap(), -25);

        let records = manager.bonuses_for_user(&admin, user).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].credits, -25);
    }

    #[tokio::test]
    async fn test_zero_grant_rejected() {
        let (manager, _ledger, admin, user) = setup().await;
        assert!(matches!(
            manager.grant(&admin, user, 0, "nothing").await,
            Err(TallyError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_member_cannot_grant() {
        let (manager, _ledger, _admin, user) = setup().await;
        let member = Actor::member(user);
        assert!(matches!(
            manager.grant(&member, user, 10, "self serve").await,
            Err(TallyError::Forbidden(_))
        ));
    }
}
