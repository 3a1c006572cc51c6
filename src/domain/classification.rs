//! Classification inputs and the keyword fallback rules.

use super::entities::{CategorySuggestion, ExpenseCategory, SuggestionSource};
use super::money::Money;
use serde::{Deserialize, Serialize};

/// Confidence reported for a fallback keyword hit.
pub const FALLBACK_MATCH_CONFIDENCE: f64 = 0.6;
/// Confidence reported when no keyword matched and the result is `other`.
pub const FALLBACK_DEFAULT_CONFIDENCE: f64 = 0.3;

/// Ordered keyword rules. First matching rule wins.
const KEYWORD_RULES: &[(ExpenseCategory, &[&str])] = &[
    (
        ExpenseCategory::Materials,
        &["lumber", "concrete", "material", "supply"],
    ),
    (ExpenseCategory::Labor, &["labor", "worker", "wage"]),
    (
        ExpenseCategory::Equipment,
        &["tool", "equipment", "machinery"],
    ),
];

/// Free-text expense to classify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub description: String,
    pub vendor: Option<String>,
    pub amount: Option<Money>,
}

impl ClassificationRequest {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            vendor: None,
            amount: None,
        }
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }
}

/// Untrusted model output as parsed from JSON. Nothing here is validated yet.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSuggestion {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// One entry of a batch request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub id: i64,
    pub description: String,
    pub vendor: Option<String>,
    pub amount: Option<Money>,
}

impl BatchItem {
    pub fn to_request(&self) -> ClassificationRequest {
        ClassificationRequest {
            description: self.description.clone(),
            vendor: self.vendor.clone(),
            amount: self.amount,
        }
    }
}

/// One successful batch entry. Missing ids in a batch response mean "could not classify".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSuggestion {
    pub id: i64,
    pub suggestion: CategorySuggestion,
}

/// Returns the first rule whose keyword appears in `description` (case-insensitive).
pub fn match_keyword_rule(description: &str) -> Option<(ExpenseCategory, &'static str)> {
    let lower = description.to_lowercase();
    KEYWORD_RULES.iter().find_map(|(category, keywords)| {
        keywords
            .iter()
            .find(|k| lower.contains(*k))
            .map(|k| (*category, *k))
    })
}

/// Deterministic keyword classification used when the model is unavailable or returns
/// something unusable.
pub fn fallback_suggestion(description: &str) -> CategorySuggestion {
    match match_keyword_rule(description) {
        Some((category, keyword)) => CategorySuggestion::new(
            category,
            FALLBACK_MATCH_CONFIDENCE,
            format!(
                "Fallback keyword match: description mentions \"{}\" (AI categorization unavailable)",
                keyword
            ),
            SuggestionSource::Fallback,
        ),
        None => CategorySuggestion::new(
            ExpenseCategory::Other,
            FALLBACK_DEFAULT_CONFIDENCE,
            "Fallback default: no category keywords found (AI categorization unavailable)",
            SuggestionSource::Fallback,
        ),
    }
}
