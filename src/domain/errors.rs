//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Rejected input. Raised before any classification or persistence work starts.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// One-way approval was attempted on an expense that is already approved.
    #[error("Expense {id} is already approved")]
    AlreadyApproved { id: i64 },

    /// Stored state changed between read and write (e.g. a concurrent reorder).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// External categorization call failed. Recovered by the keyword fallback, never surfaced
    /// from `CategoryClassifier::classify`.
    #[error("Classifier call failed: {0}")]
    Classifier(String),

    #[error("Repository error: {0}")]
    Repo(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Input aborted: {0}")]
    Input(String),
}

impl DomainError {
    pub fn expense_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "Expense",
            id,
        }
    }

    pub fn milestone_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "Milestone",
            id,
        }
    }

    /// True for errors the caller caused and should not retry unchanged.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::NotFound { .. }
                | Self::AlreadyApproved { .. }
                | Self::Conflict(_)
        )
    }
}
