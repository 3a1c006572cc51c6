//! Inbound port. UI (adapter) calls into the application.

use crate::domain::DomainError;

/// Input port: terminal front end invokes application use cases.
#[async_trait::async_trait]
pub trait InputPort: Send + Sync {
    /// Run the interactive main menu until the user exits.
    async fn run(&self) -> Result<(), DomainError>;
}
