//! Application use cases. Orchestrate domain logic via ports.

pub mod batch_classifier;
pub mod classifier;
pub mod expense_service;
pub mod milestone_sequencer;

pub use batch_classifier::{BatchClassifier, MAX_BATCH_SIZE};
pub use classifier::{CategoryClassifier, ClassifierConfig};
pub use expense_service::{CreatedExpense, ExpenseService, RecategorizeReport};
pub use milestone_sequencer::{MilestoneSequencer, ReorderOutcome};
