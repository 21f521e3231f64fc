pub mod config;
pub mod logging;

pub use config::{EngineConfig, LoggingConfig};

use std::sync::Arc;
use tally_economics::{BonusManager, Ledger, RewardManager};
use tally_store::{ChoreStore, MemoryStore};
use tally_tasks::{AssignmentManager, ProposalManager, Scheduler, TaskCatalog};

/// All chore-economy managers wired over one shared store.
///
/// Every manager reads and writes the same `ChoreStore`, so cross-cutting
/// operations (a validation paying into the ledger, an approval burning
/// stock) stay consistent through the store's transactions.
pub struct ChoreEngine {
    pub store: Arc<dyn ChoreStore>,
    pub ledger: Arc<Ledger>,
    pub rewards: Arc<RewardManager>,
    pub bonuses: Arc<BonusManager>,
    pub tasks: Arc<TaskCatalog>,
    pub assignments: Arc<AssignmentManager>,
    pub scheduler: Arc<Scheduler>,
    pub proposals: Arc<ProposalManager>,
}

impl ChoreEngine {
    pub fn new(store: Arc<dyn ChoreStore>) -> Self {
        let ledger = Arc::new(Ledger::new(store.clone()));
        Self {
            rewards: Arc::new(RewardManager::new(store.clone(), ledger.clone())),
            bonuses: Arc::new(BonusManager::new(store.clone(), ledger.clone())),
            tasks: Arc::new(TaskCatalog::new(store.clone())),
            assignments: Arc::new(AssignmentManager::new(store.clone(), ledger.clone())),
            scheduler: Arc::new(Scheduler::new(store.clone())),
            proposals: Arc::new(ProposalManager::new(store.clone())),
            ledger,
            store,
        }
    }

    /// Engine over a fresh in-memory store; the setup used by tests and
    /// the demo.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}
