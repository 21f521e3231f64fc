use chrono::Utc;
use std::sync::Arc;
use tally_store::ChoreStore;
use tally_types::{
    Actor, NewProposal, NewTask, Proposal, ProposalId, ProposalStatus, Result, ReviewDecision,
    TallyError, TaskFrequency, TaskType,
};
use tracing::{info, warn};

/// Fields for a new proposal; the submitting user becomes its owner.
#[derive(Debug, Clone)]
pub struct ProposalSpec {
    pub title: String,
    pub description: String,
    pub frequency: TaskFrequency,
    pub suggested_reward: i64,
    pub message_to_admin: Option<String>,
}

/// Admin adjustments applied at review time. Unset fields fall back to the
/// proposal's originals.
#[derive(Debug, Clone, Default)]
pub struct ReviewOverrides {
    pub title: Option<String>,
    pub description: Option<String>,
    pub reward: Option<i64>,
}

/// User-submitted task ideas reviewed by an admin. Approval (plain or with
/// modifications) spawns a real task of type `Proposed` and links it back.
pub struct ProposalManager {
    store: Arc<dyn ChoreStore>,
}

impl ProposalManager {
    pub fn new(store: Arc<dyn ChoreStore>) -> Self {
        Self { store }
    }

    pub async fn submit(&self, actor: &Actor, spec: ProposalSpec) -> Result<Proposal> {
        self.store
            .get_user(actor.user_id)
            .await?
            .ok_or_else(|| TallyError::not_found("user", actor.user_id))?;

        let proposal = self
            .store
            .insert_proposal(NewProposal {
                user_id: actor.user_id,
                title: spec.title,
                description: spec.description,
                frequency: spec.frequency,
                suggested_reward: spec.suggested_reward,
                message_to_admin: spec.message_to_admin,
            })
            .await?;
        info!(proposal = %proposal.id, user = %actor.user_id, "📜 Proposal submitted");
        Ok(proposal)
    }

    /// Decides a pending proposal. The status check runs on the row read
    /// inside the transaction; the spawned task and the proposal update
    /// commit together.
    pub async fn review(
        &self,
        actor: &Actor,
        id: ProposalId,
        decision: ReviewDecision,
        admin_notes: Option<String>,
        overrides: ReviewOverrides,
    ) -> Result<Proposal> {
        actor.ensure_admin()?;

        self.store.begin_transaction().await?;
        let result = self
            .review_inner(actor, id, decision, admin_notes, overrides)
            .await;

        match result {
            Ok(proposal) => {
                self.store.commit_transaction().await?;
                info!(proposal = %id, ?decision, "📜 Proposal reviewed");
                Ok(proposal)
            }
            Err(e) => {
                warn!(proposal = %id, error = %e, "❌ Proposal review rolled back");
                self.store.rollback_transaction().await?;
                Err(e)
            }
        }
    }

    async fn review_inner(
        &self,
        actor: &Actor,
        id: ProposalId,
        decision: ReviewDecision,
        admin_notes: Option<String>,
        overrides: ReviewOverrides,
    ) -> Result<Proposal> {
        let mut proposal = self
            .store
            .get_proposal(id)
            .await?
            .ok_or_else(|| TallyError::not_found("proposal", id))?;

        if proposal.status != ProposalStatus::Pending {
            return Err(TallyError::conflict(format!(
                "proposal {} already reviewed",
                id
            )));
        }

        proposal.status = decision.status();
        proposal.reviewed_by = Some(actor.user_id);
        proposal.reviewed_at = Some(Utc::now());
        proposal.admin_notes = admin_notes;

        if decision.spawns_task() {
            let final_title = overrides.title.unwrap_or_else(|| proposal.title.clone());
            let final_description = overrides
                .description
                .unwrap_or_else(|| proposal.description.clone());
            let final_reward = overrides.reward.unwrap_or(proposal.suggested_reward);

            let task = self
                .store
                .insert_task(NewTask {
                    title: final_title.clone(),
                    description: final_description.clone(),
                    task_type: TaskType::Proposed,
                    frequency: proposal.frequency,
                    base_value: final_reward,
                    created_by: actor.user_id,
                })
                .await?;

            proposal.final_title = Some(final_title);
            proposal.final_description = Some(final_description);
            proposal.final_reward = Some(final_reward);
            proposal.created_task = Some(task.id);
        }

        self.store.put_proposal(proposal.clone()).await?;
        Ok(proposal)
    }

    /// Admins see every proposal, members their own.
    pub async fn proposals(&self, actor: &Actor) -> Result<Vec<Proposal>> {
        if actor.role.is_admin() {
            self.store.list_proposals().await
        } else {
            self.store.proposals_for_user(actor.user_id).await
        }
    }
}
