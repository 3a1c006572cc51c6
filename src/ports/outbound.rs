//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{
    ClassificationRequest, DomainError, Expense, ExpenseCategory, Milestone, MilestoneStatus,
    NewExpense, NewMilestone, PositionChange, RawSuggestion,
};
use chrono::{DateTime, Utc};

/// Text-generation service used for expense categorization.
#[async_trait::async_trait]
pub trait AiPort: Send + Sync {
    /// Ask the model for a category. The returned value is untrusted: the caller validates the
    /// category against the enumeration and clamps confidence.
    ///
    /// `temperature` is the sampling temperature chosen by the classifier's configuration.
    async fn suggest_category(
        &self,
        request: &ClassificationRequest,
        temperature: f32,
    ) -> Result<RawSuggestion, DomainError>;
}

/// Expense store. Keyed by expense id.
#[async_trait::async_trait]
pub trait ExpenseRepoPort: Send + Sync {
    /// Insert a validated expense with its resolved category.
    async fn insert_expense(
        &self,
        expense: &NewExpense,
        category: ExpenseCategory,
    ) -> Result<Expense, DomainError>;

    async fn get_expense(&self, id: i64) -> Result<Option<Expense>, DomainError>;

    /// All expenses of a project, oldest first.
    async fn list_expenses(&self, project_id: i64) -> Result<Vec<Expense>, DomainError>;

    async fn set_category(
        &self,
        id: i64,
        category: ExpenseCategory,
    ) -> Result<Expense, DomainError>;

    /// One-way approval. Must succeed at most once per expense even under concurrent calls:
    /// a second call fails with `AlreadyApproved` and leaves the first approval untouched.
    async fn approve_expense(
        &self,
        id: i64,
        approver: &str,
        approved_at: DateTime<Utc>,
    ) -> Result<Expense, DomainError>;
}

/// Milestone store. Maintains dense positions per project.
#[async_trait::async_trait]
pub trait MilestoneRepoPort: Send + Sync {
    /// All milestones of a project ordered by position ascending.
    async fn list_milestones(&self, project_id: i64) -> Result<Vec<Milestone>, DomainError>;

    async fn get_milestone(&self, id: i64) -> Result<Option<Milestone>, DomainError>;

    /// Insert at the end of the project's order. Position = current count, assigned atomically
    /// with the insert so concurrent appends cannot share a position.
    async fn append_milestone(&self, milestone: &NewMilestone) -> Result<Milestone, DomainError>;

    /// Apply all position writes of one reorder atomically. Each change is only applied if the
    /// row still holds `change.from`; otherwise nothing is written and `Conflict` is returned.
    async fn apply_positions(
        &self,
        project_id: i64,
        changes: &[PositionChange],
    ) -> Result<(), DomainError>;

    /// Delete a milestone and close the gap it leaves in its project's positions.
    async fn delete_milestone(&self, id: i64) -> Result<Milestone, DomainError>;

    async fn update_progress(
        &self,
        id: i64,
        status: MilestoneStatus,
        progress: u8,
    ) -> Result<Milestone, DomainError>;
}
