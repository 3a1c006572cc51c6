//! Domain entities. Pure data structures for the core business.
//!
//! No storage/HTTP types here. Adapters map rows and responses into these.

use super::money::Money;
use crate::domain::DomainError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Confidence above which a caller may adopt a suggestion without asking the user.
pub const AUTO_APPLY_THRESHOLD: f64 = 0.8;

// ─────────────────────────────────────────────────────────────────────────────
// Expense categories
// ─────────────────────────────────────────────────────────────────────────────

/// Closed set of expense categories. Anything else is invalid input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Materials,
    Labor,
    Equipment,
    Transportation,
    Permits,
    Utilities,
    Subcontractor,
    Overhead,
    #[default]
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 9] = [
        ExpenseCategory::Materials,
        ExpenseCategory::Labor,
        ExpenseCategory::Equipment,
        ExpenseCategory::Transportation,
        ExpenseCategory::Permits,
        ExpenseCategory::Utilities,
        ExpenseCategory::Subcontractor,
        ExpenseCategory::Overhead,
        ExpenseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Materials => "materials",
            ExpenseCategory::Labor => "labor",
            ExpenseCategory::Equipment => "equipment",
            ExpenseCategory::Transportation => "transportation",
            ExpenseCategory::Permits => "permits",
            ExpenseCategory::Utilities => "utilities",
            ExpenseCategory::Subcontractor => "subcontractor",
            ExpenseCategory::Overhead => "overhead",
            ExpenseCategory::Other => "other",
        }
    }

    /// One-line definition used when prompting the model.
    pub fn definition(&self) -> &'static str {
        match self {
            ExpenseCategory::Materials => {
                "building materials and supplies (lumber, concrete, steel, drywall, fixtures)"
            }
            ExpenseCategory::Labor => "wages and payments to workers and crew on the payroll",
            ExpenseCategory::Equipment => "tools, machinery, and equipment purchases or rentals",
            ExpenseCategory::Transportation => "fuel, vehicle costs, delivery, and hauling",
            ExpenseCategory::Permits => "building permits, inspections, licenses, and government fees",
            ExpenseCategory::Utilities => "electricity, water, gas, internet, and temporary site services",
            ExpenseCategory::Subcontractor => "payments to subcontracted trades (electrical, plumbing, HVAC)",
            ExpenseCategory::Overhead => "office, insurance, administrative, and general business costs",
            ExpenseCategory::Other => "anything that does not fit the categories above",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseCategory {
    type Err = DomainError;

    /// Case-insensitive, surrounding whitespace ignored. Anything outside the enumeration fails.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        ExpenseCategory::ALL
            .iter()
            .find(|c| c.as_str() == needle)
            .copied()
            .ok_or_else(|| DomainError::Validation(format!("unknown expense category: {:?}", s)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Category suggestions
// ─────────────────────────────────────────────────────────────────────────────

/// Which path produced a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionSource {
    Model,
    Fallback,
}

/// Transient classifier output. Never persisted by the classifier itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySuggestion {
    pub category: ExpenseCategory,
    /// Always within [0, 1].
    pub confidence: f64,
    pub reasoning: String,
    pub source: SuggestionSource,
}

impl CategorySuggestion {
    /// Builds a suggestion, clamping confidence into [0, 1]. Non-finite values become 0.
    pub fn new(
        category: ExpenseCategory,
        confidence: f64,
        reasoning: impl Into<String>,
        source: SuggestionSource,
    ) -> Self {
        Self {
            category,
            confidence: clamp_confidence(confidence),
            reasoning: reasoning.into(),
            source,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == SuggestionSource::Fallback
    }

    /// Caller-side policy: adopt without confirmation only above the threshold.
    pub fn should_auto_apply(&self) -> bool {
        self.confidence > AUTO_APPLY_THRESHOLD
    }
}

pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Expenses
// ─────────────────────────────────────────────────────────────────────────────

/// A persisted expense record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub project_id: i64,
    pub description: String,
    pub vendor: Option<String>,
    pub amount: Money,
    pub tax: Money,
    pub category: ExpenseCategory,
    pub submitted_by: String,
    pub approved: bool,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub expense_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn total(&self) -> Money {
        self.amount + self.tax
    }
}

/// Input for creating an expense.
#[derive(Debug, Clone, Default)]
pub struct NewExpense {
    pub project_id: i64,
    pub description: String,
    pub vendor: Option<String>,
    pub amount: Money,
    pub tax: Option<Money>,
    /// Set manually by the submitter; `None` leaves it to the classifier or the `other` default.
    pub category: Option<ExpenseCategory>,
    pub submitted_by: String,
    pub expense_date: Option<NaiveDate>,
}

impl NewExpense {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.description.trim().is_empty() {
            return Err(DomainError::Validation(
                "Expense description cannot be empty".into(),
            ));
        }
        if self.submitted_by.trim().is_empty() {
            return Err(DomainError::Validation(
                "Expense submitter cannot be empty".into(),
            ));
        }
        if self.amount.is_negative() {
            return Err(DomainError::Validation(
                "Expense amount cannot be negative".into(),
            ));
        }
        if self.tax.is_some_and(|t| t.is_negative()) {
            return Err(DomainError::Validation(
                "Expense tax cannot be negative".into(),
            ));
        }
        Ok(())
    }

    pub fn tax_or_zero(&self) -> Money {
        self.tax.unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Milestones
// ─────────────────────────────────────────────────────────────────────────────

/// Stored milestone status. `Overdue` is never stored; see [`DisplayStatus`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MilestoneStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl MilestoneStatus {
    pub const ALL: [MilestoneStatus; 3] = [
        MilestoneStatus::Pending,
        MilestoneStatus::InProgress,
        MilestoneStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneStatus::Pending => "pending",
            MilestoneStatus::InProgress => "in-progress",
            MilestoneStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MilestoneStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(MilestoneStatus::Pending),
            "in-progress" => Ok(MilestoneStatus::InProgress),
            "completed" => Ok(MilestoneStatus::Completed),
            other => Err(DomainError::Validation(format!(
                "unknown milestone status: {:?}",
                other
            ))),
        }
    }
}

/// Status as shown to readers, computed at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayStatus {
    Pending,
    InProgress,
    Completed,
    Overdue,
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DisplayStatus::Pending => "pending",
            DisplayStatus::InProgress => "in-progress",
            DisplayStatus::Completed => "completed",
            DisplayStatus::Overdue => "overdue",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .iter()
            .find(|p| p.as_str() == s.trim())
            .copied()
            .ok_or_else(|| DomainError::Validation(format!("unknown priority: {:?}", s)))
    }
}

/// A project milestone. `position` is zero-based and dense within the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: MilestoneStatus,
    pub priority: Priority,
    /// 0..=100
    pub progress: u8,
    pub position: i64,
}

impl Milestone {
    pub fn display_status(&self, now: DateTime<Utc>) -> DisplayStatus {
        match self.status {
            MilestoneStatus::Completed => DisplayStatus::Completed,
            _ if now > self.ends_at => DisplayStatus::Overdue,
            MilestoneStatus::Pending => DisplayStatus::Pending,
            MilestoneStatus::InProgress => DisplayStatus::InProgress,
        }
    }
}

/// Input for creating a milestone. Position is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewMilestone {
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub priority: Priority,
}

impl NewMilestone {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::Validation(
                "Milestone title cannot be empty".into(),
            ));
        }
        if self.ends_at < self.starts_at {
            return Err(DomainError::Validation(
                "Milestone cannot end before it starts".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn milestone(status: MilestoneStatus, ends_at: DateTime<Utc>) -> Milestone {
        Milestone {
            id: 1,
            project_id: 1,
            title: "Foundation".into(),
            description: None,
            starts_at: ends_at - Duration::days(10),
            ends_at,
            status,
            priority: Priority::High,
            progress: 0,
            position: 0,
        }
    }

    #[test]
    fn test_category_parse_is_closed() {
        assert_eq!(
            " Materials ".parse::<ExpenseCategory>().unwrap(),
            ExpenseCategory::Materials
        );
        assert!("groceries".parse::<ExpenseCategory>().is_err());
        assert!("".parse::<ExpenseCategory>().is_err());
        for c in ExpenseCategory::ALL {
            assert_eq!(c.as_str().parse::<ExpenseCategory>().unwrap(), c);
        }
    }

    #[test]
    fn test_suggestion_clamps_confidence() {
        let s = CategorySuggestion::new(ExpenseCategory::Labor, 7.5, "x", SuggestionSource::Model);
        assert_eq!(s.confidence, 1.0);
        let s = CategorySuggestion::new(ExpenseCategory::Labor, -2.0, "x", SuggestionSource::Model);
        assert_eq!(s.confidence, 0.0);
        let s = CategorySuggestion::new(
            ExpenseCategory::Labor,
            f64::NAN,
            "x",
            SuggestionSource::Model,
        );
        assert_eq!(s.confidence, 0.0);
    }

    #[test]
    fn test_auto_apply_threshold_is_strict() {
        let at = CategorySuggestion::new(ExpenseCategory::Labor, 0.8, "", SuggestionSource::Model);
        let above = CategorySuggestion::new(ExpenseCategory::Labor, 0.81, "", SuggestionSource::Model);
        assert!(!at.should_auto_apply());
        assert!(above.should_auto_apply());
    }

    #[test]
    fn test_overdue_is_derived() {
        let now = Utc::now();
        let past = now - Duration::days(1);
        let future = now + Duration::days(1);

        assert_eq!(
            milestone(MilestoneStatus::Pending, past).display_status(now),
            DisplayStatus::Overdue
        );
        assert_eq!(
            milestone(MilestoneStatus::InProgress, past).display_status(now),
            DisplayStatus::Overdue
        );
        assert_eq!(
            milestone(MilestoneStatus::Completed, past).display_status(now),
            DisplayStatus::Completed
        );
        assert_eq!(
            milestone(MilestoneStatus::InProgress, future).display_status(now),
            DisplayStatus::InProgress
        );
    }

    #[test]
    fn test_new_expense_validation() {
        let mut e = NewExpense {
            project_id: 1,
            description: "   ".into(),
            amount: Money::from_units(10),
            submitted_by: "ana".into(),
            ..Default::default()
        };
        assert!(matches!(e.validate(), Err(DomainError::Validation(_))));
        e.description = "Rebar".into();
        assert!(e.validate().is_ok());
        e.tax = Some(Money::from_cents(-1));
        assert!(e.validate().is_err());
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&MilestoneStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        assert_eq!(
            "in-progress".parse::<MilestoneStatus>().unwrap(),
            MilestoneStatus::InProgress
        );
    }
}
