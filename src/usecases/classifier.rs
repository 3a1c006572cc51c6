//! Category classifier. Model-backed expense categorization with a keyword fallback.
//!
//! `classify` never surfaces a model failure: network errors, timeouts, malformed JSON and
//! categories outside the enumeration all degrade to the keyword rules. Only invalid input
//! (empty description) is an error.

use crate::domain::{
    CategorySuggestion, ClassificationRequest, DomainError, ExpenseCategory, Money,
    RawSuggestion, SuggestionSource, fallback_suggestion,
};
use crate::ports::AiPort;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Sampling and deadline settings for the model call. Passed in at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierConfig {
    /// Low values keep the model's answers close to deterministic.
    pub temperature: f32,
    /// Deadline for one model call; elapsing falls back to keywords.
    pub timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Category classifier. Cheap to clone; clones share the AI adapter.
#[derive(Clone)]
pub struct CategoryClassifier {
    ai: Option<Arc<dyn AiPort>>,
    config: ClassifierConfig,
}

impl CategoryClassifier {
    pub fn new(ai: Arc<dyn AiPort>, config: ClassifierConfig) -> Self {
        Self {
            ai: Some(ai),
            config,
        }
    }

    /// Classifier with no model configured. Every call uses the keyword rules.
    pub fn fallback_only() -> Self {
        Self {
            ai: None,
            config: ClassifierConfig::default(),
        }
    }

    pub fn has_model(&self) -> bool {
        self.ai.is_some()
    }

    /// Suggest a category for a free-text expense description.
    pub async fn classify(
        &self,
        description: &str,
        vendor: Option<&str>,
        amount: Option<Money>,
    ) -> Result<CategorySuggestion, DomainError> {
        let request = ClassificationRequest {
            description: description.to_string(),
            vendor: vendor.map(str::to_string),
            amount,
        };
        self.classify_request(&request).await
    }

    pub async fn classify_request(
        &self,
        request: &ClassificationRequest,
    ) -> Result<CategorySuggestion, DomainError> {
        let description = request.description.trim();
        if description.is_empty() {
            return Err(DomainError::Validation(
                "Expense description cannot be empty".into(),
            ));
        }

        let Some(ai) = &self.ai else {
            debug!("no AI configured; using keyword fallback");
            return Ok(fallback_suggestion(description));
        };

        match self.call_model(ai.as_ref(), request).await {
            Ok(suggestion) => {
                info!(
                    category = %suggestion.category,
                    confidence = suggestion.confidence,
                    "AI categorization complete"
                );
                Ok(suggestion)
            }
            Err(e) => {
                warn!(error = %e, "AI categorization failed; using keyword fallback");
                Ok(fallback_suggestion(description))
            }
        }
    }

    async fn call_model(
        &self,
        ai: &dyn AiPort,
        request: &ClassificationRequest,
    ) -> Result<CategorySuggestion, DomainError> {
        let raw = tokio::time::timeout(
            self.config.timeout,
            ai.suggest_category(request, self.config.temperature),
        )
        .await
        .map_err(|_| {
            DomainError::Classifier(format!("timed out after {:?}", self.config.timeout))
        })??;
        validate_model_output(raw)
    }
}

/// Turn untrusted model output into a suggestion. A category outside the enumeration fails the
/// whole call; confidence is clamped and a missing value counts as 0.
pub fn validate_model_output(raw: RawSuggestion) -> Result<CategorySuggestion, DomainError> {
    let category: ExpenseCategory = raw.category.parse().map_err(|_| {
        DomainError::Classifier(format!(
            "model returned unknown category {:?}",
            raw.category.chars().take(64).collect::<String>()
        ))
    })?;
    let reasoning = raw
        .reasoning
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| "No reasoning provided by the model".to_string());
    Ok(CategorySuggestion::new(
        category,
        raw.confidence.unwrap_or(0.0),
        reasoning,
        SuggestionSource::Model,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAiAdapter;
    use crate::domain::classification::{FALLBACK_DEFAULT_CONFIDENCE, FALLBACK_MATCH_CONFIDENCE};

    fn classifier(adapter: MockAiAdapter) -> (Arc<MockAiAdapter>, CategoryClassifier) {
        let adapter = Arc::new(adapter);
        let classifier = CategoryClassifier::new(
            Arc::clone(&adapter) as Arc<dyn AiPort>,
            ClassifierConfig {
                temperature: 0.1,
                timeout: Duration::from_millis(200),
            },
        );
        (adapter, classifier)
    }

    #[tokio::test]
    async fn test_model_answer_is_used() {
        let (_, c) = classifier(MockAiAdapter::responding(
            "permits",
            Some(0.93),
            "City building permit fee",
        ));
        let s = c.classify("City permit fee", None, None).await.unwrap();
        assert_eq!(s.category, ExpenseCategory::Permits);
        assert_eq!(s.confidence, 0.93);
        assert_eq!(s.source, SuggestionSource::Model);
        assert!(s.should_auto_apply());
    }

    #[tokio::test]
    async fn test_forced_fallback_lumber_example() {
        let (adapter, c) = classifier(MockAiAdapter::failing("connection refused"));
        let s = c
            .classify(
                "Purchased lumber from Home Depot",
                Some("Home Depot"),
                Some(Money::from_units(450)),
            )
            .await
            .unwrap();
        assert_eq!(s.category, ExpenseCategory::Materials);
        assert_eq!(s.confidence, FALLBACK_MATCH_CONFIDENCE);
        assert!(s.is_fallback());
        assert_eq!(adapter.calls(), 1);
    }

    #[tokio::test]
    async fn test_fallback_only_mode() {
        let c = CategoryClassifier::fallback_only();
        assert!(!c.has_model());
        let s = c
            .classify("Purchased lumber from Home Depot", Some("Home Depot"), None)
            .await
            .unwrap();
        assert_eq!(s.category, ExpenseCategory::Materials);
        assert_eq!(s.confidence, 0.6);

        let s = c.classify("Coffee for the team", None, None).await.unwrap();
        assert_eq!(s.category, ExpenseCategory::Other);
        assert_eq!(s.confidence, FALLBACK_DEFAULT_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_unknown_category_falls_back() {
        let (_, c) = classifier(MockAiAdapter::responding("groceries", Some(0.99), "food"));
        let s = c.classify("Crew wages for May", None, None).await.unwrap();
        assert_eq!(s.category, ExpenseCategory::Labor);
        assert!(s.is_fallback());
    }

    #[tokio::test]
    async fn test_out_of_range_confidence_is_clamped() {
        let (_, c) = classifier(MockAiAdapter::responding("utilities", Some(42.0), "power"));
        let s = c.classify("Site power", None, None).await.unwrap();
        assert_eq!(s.category, ExpenseCategory::Utilities);
        assert_eq!(s.confidence, 1.0);

        let (_, c) = classifier(MockAiAdapter::responding("utilities", Some(-3.0), "power"));
        assert_eq!(c.classify("Site power", None, None).await.unwrap().confidence, 0.0);

        let (_, c) = classifier(MockAiAdapter::responding("utilities", None, ""));
        let s = c.classify("Site power", None, None).await.unwrap();
        assert_eq!(s.confidence, 0.0);
        assert!(!s.reasoning.is_empty());
    }

    #[tokio::test]
    async fn test_adversarial_outputs_stay_in_bounds() {
        let outputs: Vec<(&str, Option<f64>)> = vec![
            ("", Some(0.5)),
            ("MATERIALS; DROP TABLE expenses", Some(0.9)),
            ("overhead", Some(f64::INFINITY)),
            ("other", Some(f64::NEG_INFINITY)),
            ("labour", Some(1.0)),
            ("  Equipment  ", Some(1e308)),
        ];
        for (category, confidence) in outputs {
            let (_, c) = classifier(MockAiAdapter::responding(category, confidence, "x"));
            let s = c.classify("Concrete pour", None, None).await.unwrap();
            assert!(ExpenseCategory::ALL.contains(&s.category));
            assert!((0.0..=1.0).contains(&s.confidence), "{:?}", s);
        }
    }

    #[tokio::test]
    async fn test_slow_model_times_out_to_fallback() {
        let (_, c) = classifier(
            MockAiAdapter::responding("overhead", Some(0.99), "x")
                .with_delay(Duration::from_secs(5)),
        );
        let s = c.classify("Tool rental", None, None).await.unwrap();
        assert_eq!(s.category, ExpenseCategory::Equipment);
        assert!(s.is_fallback());
    }

    #[tokio::test]
    async fn test_empty_description_rejected_before_model_call() {
        let (adapter, c) = classifier(MockAiAdapter::responding("labor", Some(0.9), "x"));
        let err = c.classify("   ", Some("Vendor"), None).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(adapter.calls(), 0);
    }

    #[tokio::test]
    async fn test_temperature_comes_from_config() {
        let adapter = Arc::new(MockAiAdapter::responding("labor", Some(0.9), "x"));
        let seen = Arc::new(std::sync::Mutex::new(None));
        struct Recording {
            inner: Arc<MockAiAdapter>,
            seen: Arc<std::sync::Mutex<Option<f32>>>,
        }
        #[async_trait::async_trait]
        impl AiPort for Recording {
            async fn suggest_category(
                &self,
                request: &ClassificationRequest,
                temperature: f32,
            ) -> Result<RawSuggestion, DomainError> {
                *self.seen.lock().unwrap() = Some(temperature);
                self.inner.suggest_category(request, temperature).await
            }
        }
        let c = CategoryClassifier::new(
            Arc::new(Recording {
                inner: adapter,
                seen: Arc::clone(&seen),
            }),
            ClassifierConfig {
                temperature: 0.05,
                timeout: Duration::from_secs(1),
            },
        );
        c.classify("Wages", None, None).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(0.05));
    }
}
