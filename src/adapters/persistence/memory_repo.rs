//! In-memory store. Implements ExpenseRepoPort and MilestoneRepoPort behind one RwLock.
//!
//! Every operation holds the write lock for its whole duration, which gives the same
//! all-or-nothing behaviour as the SQLite transactions. Used for demos and tests.

use crate::domain::{
    DomainError, Expense, ExpenseCategory, Milestone, MilestoneStatus, NewExpense, NewMilestone,
    PositionChange,
};
use crate::ports::{ExpenseRepoPort, MilestoneRepoPort};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct StoreData {
    next_id: i64,
    expenses: BTreeMap<i64, Expense>,
    milestones: BTreeMap<i64, Milestone>,
}

impl StoreData {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn project_milestones(&self, project_id: i64) -> Vec<Milestone> {
        let mut list: Vec<Milestone> = self
            .milestones
            .values()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect();
        list.sort_by_key(|m| (m.position, m.id));
        list
    }
}

/// In-memory store.
#[derive(Default)]
pub struct MemoryRepo {
    data: RwLock<StoreData>,
    position_writes: AtomicUsize,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of single-milestone position writes applied by reorders so far.
    pub fn position_writes(&self) -> usize {
        self.position_writes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ExpenseRepoPort for MemoryRepo {
    async fn insert_expense(
        &self,
        expense: &NewExpense,
        category: ExpenseCategory,
    ) -> Result<Expense, DomainError> {
        let mut data = self.data.write().await;
        let id = data.allocate_id();
        let created = Expense {
            id,
            project_id: expense.project_id,
            description: expense.description.trim().to_string(),
            vendor: expense.vendor.clone(),
            amount: expense.amount,
            tax: expense.tax_or_zero(),
            category,
            submitted_by: expense.submitted_by.trim().to_string(),
            approved: false,
            approved_by: None,
            approved_at: None,
            expense_date: expense.expense_date,
            created_at: Utc::now(),
        };
        data.expenses.insert(id, created.clone());
        Ok(created)
    }

    async fn get_expense(&self, id: i64) -> Result<Option<Expense>, DomainError> {
        Ok(self.data.read().await.expenses.get(&id).cloned())
    }

    async fn list_expenses(&self, project_id: i64) -> Result<Vec<Expense>, DomainError> {
        let data = self.data.read().await;
        Ok(data
            .expenses
            .values()
            .filter(|e| e.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn set_category(
        &self,
        id: i64,
        category: ExpenseCategory,
    ) -> Result<Expense, DomainError> {
        let mut data = self.data.write().await;
        let expense = data
            .expenses
            .get_mut(&id)
            .ok_or_else(|| DomainError::expense_not_found(id))?;
        expense.category = category;
        Ok(expense.clone())
    }

    async fn approve_expense(
        &self,
        id: i64,
        approver: &str,
        approved_at: DateTime<Utc>,
    ) -> Result<Expense, DomainError> {
        let mut data = self.data.write().await;
        let expense = data
            .expenses
            .get_mut(&id)
            .ok_or_else(|| DomainError::expense_not_found(id))?;
        if expense.approved {
            return Err(DomainError::AlreadyApproved { id });
        }
        expense.approved = true;
        expense.approved_by = Some(approver.to_string());
        expense.approved_at = Some(approved_at);
        Ok(expense.clone())
    }
}

#[async_trait::async_trait]
impl MilestoneRepoPort for MemoryRepo {
    async fn list_milestones(&self, project_id: i64) -> Result<Vec<Milestone>, DomainError> {
        Ok(self.data.read().await.project_milestones(project_id))
    }

    async fn get_milestone(&self, id: i64) -> Result<Option<Milestone>, DomainError> {
        Ok(self.data.read().await.milestones.get(&id).cloned())
    }

    async fn append_milestone(&self, milestone: &NewMilestone) -> Result<Milestone, DomainError> {
        let mut data = self.data.write().await;
        let position = data
            .milestones
            .values()
            .filter(|m| m.project_id == milestone.project_id)
            .count() as i64;
        let id = data.allocate_id();
        let created = Milestone {
            id,
            project_id: milestone.project_id,
            title: milestone.title.trim().to_string(),
            description: milestone.description.clone(),
            starts_at: milestone.starts_at,
            ends_at: milestone.ends_at,
            status: MilestoneStatus::Pending,
            priority: milestone.priority,
            progress: 0,
            position,
        };
        data.milestones.insert(id, created.clone());
        Ok(created)
    }

    async fn apply_positions(
        &self,
        project_id: i64,
        changes: &[PositionChange],
    ) -> Result<(), DomainError> {
        let mut data = self.data.write().await;
        // Validate the whole set before touching anything.
        for change in changes {
            let current = data
                .milestones
                .get(&change.milestone_id)
                .filter(|m| m.project_id == project_id);
            if current.map(|m| m.position) != Some(change.from) {
                return Err(DomainError::Conflict(format!(
                    "milestone {} is no longer at position {} in project {}",
                    change.milestone_id, change.from, project_id
                )));
            }
        }
        for change in changes {
            if let Some(m) = data.milestones.get_mut(&change.milestone_id) {
                m.position = change.to;
                self.position_writes.fetch_add(1, Ordering::SeqCst);
            }
        }
        Ok(())
    }

    async fn delete_milestone(&self, id: i64) -> Result<Milestone, DomainError> {
        let mut data = self.data.write().await;
        let deleted = data
            .milestones
            .remove(&id)
            .ok_or_else(|| DomainError::milestone_not_found(id))?;
        for m in data.milestones.values_mut() {
            if m.project_id == deleted.project_id && m.position > deleted.position {
                m.position -= 1;
            }
        }
        Ok(deleted)
    }

    async fn update_progress(
        &self,
        id: i64,
        status: MilestoneStatus,
        progress: u8,
    ) -> Result<Milestone, DomainError> {
        let mut data = self.data.write().await;
        let m = data
            .milestones
            .get_mut(&id)
            .ok_or_else(|| DomainError::milestone_not_found(id))?;
        m.status = status;
        m.progress = progress;
        Ok(m.clone())
    }
}
