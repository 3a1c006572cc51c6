//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod classification;
pub mod entities;
pub mod errors;
pub mod money;
pub mod ordering;

pub use classification::{
    BatchItem, BatchSuggestion, ClassificationRequest, RawSuggestion, fallback_suggestion,
};
pub use entities::{
    AUTO_APPLY_THRESHOLD, CategorySuggestion, DisplayStatus, Expense, ExpenseCategory, Milestone,
    MilestoneStatus, NewExpense, NewMilestone, Priority, SuggestionSource,
};
pub use errors::DomainError;
pub use money::Money;
pub use ordering::{PositionChange, ReorderPlan, plan_reorder};
