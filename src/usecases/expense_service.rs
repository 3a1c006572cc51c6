//! Expense service. Creation with category suggestions, approval, reporting.
//!
//! Coordinates the expense store and the classifiers. The classifiers never write to the store;
//! this service decides whether a suggestion is persisted.

use crate::adapters::export::expenses_to_csv;
use crate::domain::{
    BatchItem, CategorySuggestion, DomainError, Expense, ExpenseCategory, Money, NewExpense,
};
use crate::ports::ExpenseRepoPort;
use crate::usecases::batch_classifier::{BatchClassifier, MAX_BATCH_SIZE};
use crate::usecases::classifier::CategoryClassifier;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Result of creating an expense.
#[derive(Debug, Clone)]
pub struct CreatedExpense {
    pub expense: Expense,
    /// Present when the classifier ran. If `auto_applied` is false the caller should offer it
    /// for manual acceptance.
    pub suggestion: Option<CategorySuggestion>,
    pub auto_applied: bool,
}

/// Summary of a `classify_uncategorized` run.
#[derive(Debug, Default)]
pub struct RecategorizeReport {
    pub considered: usize,
    pub suggested: usize,
    /// Expenses whose category was changed automatically.
    pub applied: Vec<Expense>,
    /// Suggestions below the auto-apply threshold, left for manual review.
    pub pending_review: Vec<(i64, CategorySuggestion)>,
}

pub struct ExpenseService {
    repo: Arc<dyn ExpenseRepoPort>,
    classifier: CategoryClassifier,
    batch: BatchClassifier,
}

impl ExpenseService {
    pub fn new(repo: Arc<dyn ExpenseRepoPort>, classifier: CategoryClassifier) -> Self {
        Self {
            repo,
            batch: BatchClassifier::new(classifier.clone()),
            classifier,
        }
    }

    pub fn classifier(&self) -> &CategoryClassifier {
        &self.classifier
    }

    /// Create an expense.
    ///
    /// A category given by the submitter always wins. Otherwise, with `auto_classify`, the
    /// classifier runs and its suggestion is stored only above the auto-apply threshold;
    /// everything else is stored as `other`.
    pub async fn create(
        &self,
        new: NewExpense,
        auto_classify: bool,
    ) -> Result<CreatedExpense, DomainError> {
        new.validate()?;

        let (category, suggestion, auto_applied) = match new.category {
            Some(category) => (category, None, false),
            None if auto_classify => {
                let suggestion = self
                    .classifier
                    .classify(&new.description, new.vendor.as_deref(), Some(new.amount))
                    .await?;
                if suggestion.should_auto_apply() {
                    (suggestion.category, Some(suggestion), true)
                } else {
                    (ExpenseCategory::Other, Some(suggestion), false)
                }
            }
            None => (ExpenseCategory::Other, None, false),
        };

        let expense = self.repo.insert_expense(&new, category).await?;
        info!(
            id = expense.id,
            project_id = expense.project_id,
            category = %expense.category,
            auto_applied,
            "expense created"
        );
        Ok(CreatedExpense {
            expense,
            suggestion,
            auto_applied,
        })
    }

    /// Suggest a category for an existing expense (edit time). Does not modify the expense.
    pub async fn suggest_category(&self, id: i64) -> Result<CategorySuggestion, DomainError> {
        let expense = self.get(id).await?;
        self.classifier
            .classify(
                &expense.description,
                expense.vendor.as_deref(),
                Some(expense.amount),
            )
            .await
    }

    pub async fn get(&self, id: i64) -> Result<Expense, DomainError> {
        self.repo
            .get_expense(id)
            .await?
            .ok_or_else(|| DomainError::expense_not_found(id))
    }

    pub async fn set_category(
        &self,
        id: i64,
        category: ExpenseCategory,
    ) -> Result<Expense, DomainError> {
        let expense = self.repo.set_category(id, category).await?;
        info!(id, category = %category, "expense recategorized");
        Ok(expense)
    }

    /// Approve an expense. One-way: a second approval fails with `AlreadyApproved`. The approver
    /// must be someone other than the submitter.
    pub async fn approve(&self, id: i64, approver: &str) -> Result<Expense, DomainError> {
        let approver = approver.trim();
        if approver.is_empty() {
            return Err(DomainError::Validation("Approver cannot be empty".into()));
        }
        let expense = self.get(id).await?;
        if expense.approved {
            return Err(DomainError::AlreadyApproved { id });
        }
        if expense.submitted_by.eq_ignore_ascii_case(approver) {
            return Err(DomainError::Validation(
                "Expenses must be approved by someone other than the submitter".into(),
            ));
        }

        let approved = self.repo.approve_expense(id, approver, Utc::now()).await?;
        info!(id, approver, "expense approved");
        Ok(approved)
    }

    pub async fn list(&self, project_id: i64) -> Result<Vec<Expense>, DomainError> {
        self.repo.list_expenses(project_id).await
    }

    /// Sum of expense totals (amount + tax) per category. Categories without expenses are left out.
    pub async fn category_totals(
        &self,
        project_id: i64,
    ) -> Result<BTreeMap<ExpenseCategory, Money>, DomainError> {
        let mut totals: BTreeMap<ExpenseCategory, Money> = BTreeMap::new();
        for expense in self.repo.list_expenses(project_id).await? {
            let entry = totals.entry(expense.category).or_default();
            *entry = *entry + expense.total();
        }
        Ok(totals)
    }

    pub async fn export_csv(&self, project_id: i64) -> Result<String, DomainError> {
        let expenses = self.repo.list_expenses(project_id).await?;
        expenses_to_csv(&expenses).map_err(|e| DomainError::Export(e.to_string()))
    }

    /// Run the batch classifier over expenses still filed as `other`, in chunks of the batch
    /// limit. Confident suggestions are applied; the rest are returned for review.
    pub async fn classify_uncategorized(
        &self,
        project_id: i64,
    ) -> Result<RecategorizeReport, DomainError> {
        let candidates: Vec<BatchItem> = self
            .repo
            .list_expenses(project_id)
            .await?
            .into_iter()
            .filter(|e| e.category == ExpenseCategory::Other)
            .map(|e| BatchItem {
                id: e.id,
                description: e.description,
                vendor: e.vendor,
                amount: Some(e.amount),
            })
            .collect();

        let mut report = RecategorizeReport {
            considered: candidates.len(),
            ..Default::default()
        };

        for chunk in candidates.chunks(MAX_BATCH_SIZE) {
            let results = self.batch.classify_batch(chunk.to_vec()).await?;
            report.suggested += results.len();
            for result in results {
                let suggestion = result.suggestion;
                if suggestion.category == ExpenseCategory::Other {
                    continue;
                }
                if suggestion.should_auto_apply() {
                    let updated = self.repo.set_category(result.id, suggestion.category).await?;
                    report.applied.push(updated);
                } else {
                    report.pending_review.push((result.id, suggestion));
                }
            }
        }

        info!(
            project_id,
            considered = report.considered,
            applied = report.applied.len(),
            pending_review = report.pending_review.len(),
            "uncategorized expenses processed"
        );
        Ok(report)
    }
}
