//! Batch classifier. Fans out one classification per item and keeps only the successes.

use crate::domain::{BatchItem, BatchSuggestion, CategorySuggestion, DomainError};
use crate::usecases::classifier::CategoryClassifier;
use tokio::task::{JoinError, JoinSet};
use tracing::{info, warn};

/// Largest batch accepted. Larger requests are rejected before any classification starts.
pub const MAX_BATCH_SIZE: usize = 50;

/// Outcome of one spawned classification: input index, item id, classifier result.
pub type ItemOutcome = Result<(usize, i64, Result<CategorySuggestion, DomainError>), JoinError>;

/// Best-effort batch wrapper around [`CategoryClassifier`].
#[derive(Clone)]
pub struct BatchClassifier {
    classifier: CategoryClassifier,
}

impl BatchClassifier {
    pub fn new(classifier: CategoryClassifier) -> Self {
        Self { classifier }
    }

    /// Classify every item concurrently. Items that fail (invalid input, panicked task) are
    /// omitted from the result; the batch itself only fails on the size limit.
    pub async fn classify_batch(
        &self,
        items: Vec<BatchItem>,
    ) -> Result<Vec<BatchSuggestion>, DomainError> {
        if items.len() > MAX_BATCH_SIZE {
            return Err(DomainError::Validation(format!(
                "Batch of {} items exceeds the limit of {}",
                items.len(),
                MAX_BATCH_SIZE
            )));
        }

        let requested = items.len();
        let mut tasks = JoinSet::new();
        for (index, item) in items.into_iter().enumerate() {
            let classifier = self.classifier.clone();
            tasks.spawn(async move {
                let outcome = classifier.classify_request(&item.to_request()).await;
                (index, item.id, outcome)
            });
        }

        let mut outcomes = Vec::with_capacity(requested);
        while let Some(joined) = tasks.join_next().await {
            outcomes.push(joined);
        }

        let results = collect_successes(outcomes);
        info!(
            requested,
            classified = results.len(),
            omitted = requested - results.len(),
            "batch classification complete"
        );
        Ok(results)
    }
}

/// Settle step: keep successful classifications, drop (and log) every failure. Results come
/// back in input order.
pub fn collect_successes(outcomes: Vec<ItemOutcome>) -> Vec<BatchSuggestion> {
    let mut successes: Vec<(usize, BatchSuggestion)> = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Ok((index, id, Ok(suggestion))) => {
                successes.push((index, BatchSuggestion { id, suggestion }));
            }
            Ok((_, id, Err(e))) => {
                warn!(id, error = %e, "batch item not classified; omitted");
            }
            Err(e) => {
                warn!(error = %e, "batch classification task failed; omitted");
            }
        }
    }
    successes.sort_by_key(|(index, _)| *index);
    successes.into_iter().map(|(_, s)| s).collect()
}
