//! Mock AI adapter for testing without API calls.
//!
//! Responses are produced by a caller-supplied closure, so tests can script valid answers,
//! adversarial garbage, failures and slow responses.

use crate::domain::{ClassificationRequest, DomainError, RawSuggestion};
use crate::ports::AiPort;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;

type Responder = dyn Fn(&ClassificationRequest) -> Result<RawSuggestion, DomainError> + Send + Sync;

/// Mock AI adapter for testing.
///
/// Counts calls so tests can assert that validation happened before any model call.
pub struct MockAiAdapter {
    responder: Arc<Responder>,
    /// Simulated network delay.
    delay: Duration,
    calls: AtomicUsize,
}

impl MockAiAdapter {
    /// Adapter answering every request with the closure's result.
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&ClassificationRequest) -> Result<RawSuggestion, DomainError> + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always returns the given category/confidence/reasoning, verbatim and unvalidated.
    pub fn responding(category: &str, confidence: Option<f64>, reasoning: &str) -> Self {
        let raw = RawSuggestion {
            category: category.to_string(),
            confidence,
            reasoning: Some(reasoning.to_string()),
        };
        Self::from_fn(move |_| Ok(raw.clone()))
    }

    /// Always fails as if the service were unreachable.
    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::from_fn(move |_| Err(DomainError::Classifier(message.clone())))
    }

    /// Add simulated latency to every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of `suggest_category` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AiPort for MockAiAdapter {
    async fn suggest_category(
        &self,
        request: &ClassificationRequest,
        temperature: f32,
    ) -> Result<RawSuggestion, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        info!(
            description_len = request.description.len(),
            temperature,
            "[MOCK] Simulating AI categorization"
        );

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        (self.responder)(request)
    }
}
