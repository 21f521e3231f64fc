pub mod assignment;
pub mod catalog;
pub mod proposal;
pub mod scheduler;

pub use assignment::AssignmentManager;
pub use catalog::{TaskCatalog, TaskSpec, TaskUpdate};
pub use proposal::{ProposalManager, ProposalSpec, ReviewOverrides};
pub use scheduler::{Recurrence, Scheduler};
