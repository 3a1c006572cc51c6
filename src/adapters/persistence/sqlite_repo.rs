//! SQLite-backed store via libsql. Implements ExpenseRepoPort and MilestoneRepoPort.
//!
//! One database file (data/sitebook.db) holds both tables. Timestamps are stored as unix seconds,
//! money as integer cents. Multi-row writes (append, reorder, delete) run inside IMMEDIATE
//! transactions so the dense position invariant holds under concurrent requests.

use crate::domain::{
    DomainError, Expense, ExpenseCategory, Milestone, MilestoneStatus, Money, NewExpense,
    NewMilestone, PositionChange,
};
use crate::ports::{ExpenseRepoPort, MilestoneRepoPort};
use chrono::{DateTime, NaiveDate, Utc};
use libsql::{Connection, Database, Row, TransactionBehavior, params};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const EXPENSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS expenses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    description TEXT NOT NULL,
    vendor TEXT,
    amount_cents INTEGER NOT NULL CHECK (amount_cents >= 0),
    tax_cents INTEGER NOT NULL DEFAULT 0 CHECK (tax_cents >= 0),
    category TEXT NOT NULL DEFAULT 'other',
    submitted_by TEXT NOT NULL,
    approved INTEGER NOT NULL DEFAULT 0,
    approved_by TEXT,
    approved_at INTEGER,
    expense_date TEXT,
    created_at INTEGER NOT NULL
)"#;
const EXPENSES_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_expenses_project ON expenses (project_id, id)";

const MILESTONES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS milestones (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    starts_at INTEGER NOT NULL,
    ends_at INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    priority TEXT NOT NULL DEFAULT 'medium',
    progress INTEGER NOT NULL DEFAULT 0 CHECK (progress BETWEEN 0 AND 100),
    position INTEGER NOT NULL
)"#;
const MILESTONES_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_milestones_project_position ON milestones (project_id, position)";

const EXPENSE_COLUMNS: &str = "id, project_id, description, vendor, amount_cents, tax_cents, category, submitted_by, approved, approved_by, approved_at, expense_date, created_at";
const MILESTONE_COLUMNS: &str =
    "id, project_id, title, description, starts_at, ends_at, status, priority, progress, position";

/// Milliseconds a connection waits on a locked database before failing.
const BUSY_TIMEOUT_MS: u32 = 5000;

fn repo_err(e: libsql::Error) -> DomainError {
    DomainError::Repo(e.to_string())
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, DomainError> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| DomainError::Repo(format!("invalid timestamp: {}", secs)))
}

/// SQLite store. Safe to share via Arc; each call opens its own connection.
pub struct SqliteRepo {
    db: Database,
    db_path: PathBuf,
}

impl SqliteRepo {
    /// Connect to (or create) the database and ensure the schema exists.
    ///
    /// Sets WAL mode and synchronous=NORMAL for concurrent readers with one writer.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(|e| DomainError::Repo(e.to_string()))?;
        let db_path = base.join("sitebook.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(repo_err)?;

        let repo = Self {
            db,
            db_path: db_path.clone(),
        };
        let conn = repo.conn().await?;

        // PRAGMA returns a row (new value); execute fails when rows are returned.
        Self::pragma(&conn, "PRAGMA journal_mode=WAL").await?;
        Self::pragma(&conn, "PRAGMA synchronous=NORMAL").await?;

        for ddl in [
            EXPENSES_TABLE,
            EXPENSES_INDEX,
            MILESTONES_TABLE,
            MILESTONES_INDEX,
        ] {
            conn.execute(ddl, ()).await.map_err(repo_err)?;
        }

        info!(path = %db_path.display(), "SQLite connected with WAL mode");
        Ok(repo)
    }

    /// Location of the database file.
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    async fn conn(&self) -> Result<Connection, DomainError> {
        let conn = self.db.connect().map_err(repo_err)?;
        Self::pragma(&conn, &format!("PRAGMA busy_timeout={}", BUSY_TIMEOUT_MS)).await?;
        Ok(conn)
    }

    async fn pragma(conn: &Connection, sql: &str) -> Result<(), DomainError> {
        let mut rows = conn
            .query(sql, ())
            .await
            .map_err(|e| DomainError::Repo(format!("{} failed: {}", sql, e)))?;
        while rows.next().await.map_err(repo_err)?.is_some() {}
        Ok(())
    }

    fn row_to_expense(row: &Row) -> Result<Expense, DomainError> {
        let category: String = row.get(6).map_err(repo_err)?;
        let approved_at: Option<i64> = row.get(10).ok();
        let expense_date: Option<String> = row.get(11).ok();
        Ok(Expense {
            id: row.get(0).map_err(repo_err)?,
            project_id: row.get(1).map_err(repo_err)?,
            description: row.get(2).map_err(repo_err)?,
            vendor: row.get(3).ok(),
            amount: Money::from_cents(row.get(4).map_err(repo_err)?),
            tax: Money::from_cents(row.get(5).map_err(repo_err)?),
            category: category.parse()?,
            submitted_by: row.get(7).map_err(repo_err)?,
            approved: row.get::<i64>(8).map_err(repo_err)? != 0,
            approved_by: row.get(9).ok(),
            approved_at: approved_at.map(timestamp).transpose()?,
            expense_date: expense_date
                .map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d"))
                .transpose()
                .map_err(|e| DomainError::Repo(format!("invalid expense_date: {}", e)))?,
            created_at: timestamp(row.get(12).map_err(repo_err)?)?,
        })
    }

    fn row_to_milestone(row: &Row) -> Result<Milestone, DomainError> {
        let status: String = row.get(6).map_err(repo_err)?;
        let priority: String = row.get(7).map_err(repo_err)?;
        let progress: i64 = row.get(8).map_err(repo_err)?;
        Ok(Milestone {
            id: row.get(0).map_err(repo_err)?,
            project_id: row.get(1).map_err(repo_err)?,
            title: row.get(2).map_err(repo_err)?,
            description: row.get(3).ok(),
            starts_at: timestamp(row.get(4).map_err(repo_err)?)?,
            ends_at: timestamp(row.get(5).map_err(repo_err)?)?,
            status: status.parse()?,
            priority: priority.parse()?,
            progress: u8::try_from(progress.clamp(0, 100)).unwrap_or(100),
            position: row.get(9).map_err(repo_err)?,
        })
    }

    async fn fetch_expense(conn: &Connection, id: i64) -> Result<Option<Expense>, DomainError> {
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM expenses WHERE id = ?1", EXPENSE_COLUMNS),
                params![id],
            )
            .await
            .map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => Ok(Some(Self::row_to_expense(&row)?)),
            None => Ok(None),
        }
    }

    async fn fetch_milestone(conn: &Connection, id: i64) -> Result<Option<Milestone>, DomainError> {
        let mut rows = conn
            .query(
                &format!("SELECT {} FROM milestones WHERE id = ?1", MILESTONE_COLUMNS),
                params![id],
            )
            .await
            .map_err(repo_err)?;
        match rows.next().await.map_err(repo_err)? {
            Some(row) => Ok(Some(Self::row_to_milestone(&row)?)),
            None => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl ExpenseRepoPort for SqliteRepo {
    async fn insert_expense(
        &self,
        expense: &NewExpense,
        category: ExpenseCategory,
    ) -> Result<Expense, DomainError> {
        let conn = self.conn().await?;
        let now = Utc::now().timestamp();
        let expense_date = expense
            .expense_date
            .map(|d| d.format("%Y-%m-%d").to_string());
        conn.execute(
            r#"
            INSERT INTO expenses (project_id, description, vendor, amount_cents, tax_cents, category, submitted_by, expense_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                expense.project_id,
                expense.description.trim(),
                expense.vendor.clone(),
                expense.amount.cents(),
                expense.tax_or_zero().cents(),
                category.as_str(),
                expense.submitted_by.trim(),
                expense_date,
                now
            ],
        )
        .await
        .map_err(repo_err)?;
        let id = conn.last_insert_rowid();
        debug!(id, project_id = expense.project_id, "expense inserted");

        Self::fetch_expense(&conn, id)
            .await?
            .ok_or_else(|| DomainError::expense_not_found(id))
    }

    async fn get_expense(&self, id: i64) -> Result<Option<Expense>, DomainError> {
        let conn = self.conn().await?;
        Self::fetch_expense(&conn, id).await
    }

    async fn list_expenses(&self, project_id: i64) -> Result<Vec<Expense>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM expenses WHERE project_id = ?1 ORDER BY id ASC",
                    EXPENSE_COLUMNS
                ),
                params![project_id],
            )
            .await
            .map_err(repo_err)?;
        let mut expenses = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            expenses.push(Self::row_to_expense(&row)?);
        }
        Ok(expenses)
    }

    async fn set_category(
        &self,
        id: i64,
        category: ExpenseCategory,
    ) -> Result<Expense, DomainError> {
        let conn = self.conn().await?;
        let updated = conn
            .execute(
                "UPDATE expenses SET category = ?1 WHERE id = ?2",
                params![category.as_str(), id],
            )
            .await
            .map_err(repo_err)?;
        if updated == 0 {
            return Err(DomainError::expense_not_found(id));
        }
        Self::fetch_expense(&conn, id)
            .await?
            .ok_or_else(|| DomainError::expense_not_found(id))
    }

    async fn approve_expense(
        &self,
        id: i64,
        approver: &str,
        approved_at: DateTime<Utc>,
    ) -> Result<Expense, DomainError> {
        let conn = self.conn().await?;
        // Conditional update: only one caller can flip approved 0 -> 1.
        let updated = conn
            .execute(
                "UPDATE expenses SET approved = 1, approved_by = ?1, approved_at = ?2 WHERE id = ?3 AND approved = 0",
                params![approver, approved_at.timestamp(), id],
            )
            .await
            .map_err(repo_err)?;

        let current = Self::fetch_expense(&conn, id)
            .await?
            .ok_or_else(|| DomainError::expense_not_found(id))?;
        if updated == 0 {
            return Err(DomainError::AlreadyApproved { id });
        }
        Ok(current)
    }
}

#[async_trait::async_trait]
impl MilestoneRepoPort for SqliteRepo {
    async fn list_milestones(&self, project_id: i64) -> Result<Vec<Milestone>, DomainError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM milestones WHERE project_id = ?1 ORDER BY position ASC, id ASC",
                    MILESTONE_COLUMNS
                ),
                params![project_id],
            )
            .await
            .map_err(repo_err)?;
        let mut milestones = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            milestones.push(Self::row_to_milestone(&row)?);
        }
        Ok(milestones)
    }

    async fn get_milestone(&self, id: i64) -> Result<Option<Milestone>, DomainError> {
        let conn = self.conn().await?;
        Self::fetch_milestone(&conn, id).await
    }

    async fn append_milestone(&self, milestone: &NewMilestone) -> Result<Milestone, DomainError> {
        let conn = self.conn().await?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await
            .map_err(repo_err)?;
        // Count and insert in one statement under the write lock: no read-then-insert race.
        tx.execute(
            r#"
            INSERT INTO milestones (project_id, title, description, starts_at, ends_at, status, priority, progress, position)
            SELECT ?1, ?2, ?3, ?4, ?5, 'pending', ?6, 0, COUNT(*)
            FROM milestones WHERE project_id = ?1
            "#,
            params![
                milestone.project_id,
                milestone.title.trim(),
                milestone.description.clone(),
                milestone.starts_at.timestamp(),
                milestone.ends_at.timestamp(),
                milestone.priority.as_str()
            ],
        )
        .await
        .map_err(repo_err)?;
        let id = tx.last_insert_rowid();
        let created = Self::fetch_milestone(&tx, id)
            .await?
            .ok_or_else(|| DomainError::milestone_not_found(id))?;
        tx.commit().await.map_err(repo_err)?;

        debug!(
            id,
            project_id = created.project_id,
            position = created.position,
            "milestone appended"
        );
        Ok(created)
    }

    async fn apply_positions(
        &self,
        project_id: i64,
        changes: &[PositionChange],
    ) -> Result<(), DomainError> {
        if changes.is_empty() {
            return Ok(());
        }
        let conn = self.conn().await?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await
            .map_err(repo_err)?;
        for change in changes {
            let updated = tx
                .execute(
                    "UPDATE milestones SET position = ?1 WHERE id = ?2 AND project_id = ?3 AND position = ?4",
                    params![change.to, change.milestone_id, project_id, change.from],
                )
                .await;
            match updated {
                Ok(1) => {}
                Ok(_) => {
                    tx.rollback().await.map_err(repo_err)?;
                    return Err(DomainError::Conflict(format!(
                        "milestone {} is no longer at position {} in project {}",
                        change.milestone_id, change.from, project_id
                    )));
                }
                Err(e) => {
                    if let Err(rollback) = tx.rollback().await {
                        warn!(error = %rollback, project_id, "rollback after failed position write");
                    }
                    return Err(repo_err(e));
                }
            }
        }
        tx.commit().await.map_err(repo_err)?;
        Ok(())
    }

    async fn delete_milestone(&self, id: i64) -> Result<Milestone, DomainError> {
        let conn = self.conn().await?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await
            .map_err(repo_err)?;
        let Some(deleted) = Self::fetch_milestone(&tx, id).await? else {
            tx.rollback().await.map_err(repo_err)?;
            return Err(DomainError::milestone_not_found(id));
        };
        tx.execute("DELETE FROM milestones WHERE id = ?1", params![id])
            .await
            .map_err(repo_err)?;
        tx.execute(
            "UPDATE milestones SET position = position - 1 WHERE project_id = ?1 AND position > ?2",
            params![deleted.project_id, deleted.position],
        )
        .await
        .map_err(repo_err)?;
        tx.commit().await.map_err(repo_err)?;
        Ok(deleted)
    }

    async fn update_progress(
        &self,
        id: i64,
        status: MilestoneStatus,
        progress: u8,
    ) -> Result<Milestone, DomainError> {
        let conn = self.conn().await?;
        let updated = conn
            .execute(
                "UPDATE milestones SET status = ?1, progress = ?2 WHERE id = ?3",
                params![status.as_str(), i64::from(progress), id],
            )
            .await
            .map_err(repo_err)?;
        if updated == 0 {
            return Err(DomainError::milestone_not_found(id));
        }
        Self::fetch_milestone(&conn, id)
            .await?
            .ok_or_else(|| DomainError::milestone_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ordering::{is_dense, plan_reorder};
    use crate::domain::Priority;
    use crate::usecases::MilestoneSequencer;
    use chrono::Duration;
    use std::sync::Arc;

    async fn repo() -> (tempfile::TempDir, SqliteRepo) {
        let dir = tempfile::tempdir().unwrap();
        let repo = SqliteRepo::connect(dir.path()).await.unwrap();
        (dir, repo)
    }

    fn new_milestone(project_id: i64, title: &str) -> NewMilestone {
        let now = Utc::now();
        NewMilestone {
            project_id,
            title: title.into(),
            description: None,
            starts_at: now,
            ends_at: now + Duration::days(14),
            priority: Priority::High,
        }
    }

    fn new_expense(description: &str) -> NewExpense {
        NewExpense {
            project_id: 1,
            description: description.into(),
            vendor: Some("Home Depot".into()),
            amount: Money::from_units(450),
            tax: Some(Money::from_cents(3600)),
            category: None,
            submitted_by: "ana".into(),
            expense_date: NaiveDate::from_ymd_opt(2024, 5, 1),
        }
    }

    #[tokio::test]
    async fn test_expense_roundtrip_and_total() {
        let (_dir, repo) = repo().await;
        let created = repo
            .insert_expense(&new_expense("Lumber"), ExpenseCategory::Materials)
            .await
            .unwrap();
        assert_eq!(created.category, ExpenseCategory::Materials);
        assert_eq!(created.total(), Money::from_cents(48600));
        assert!(!created.approved);
        assert_eq!(created.expense_date, NaiveDate::from_ymd_opt(2024, 5, 1));

        let listed = repo.list_expenses(1).await.unwrap();
        assert_eq!(listed, vec![created]);
        assert!(repo.list_expenses(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_double_approval_is_rejected() {
        let (_dir, repo) = repo().await;
        let e = repo
            .insert_expense(&new_expense("Lumber"), ExpenseCategory::Materials)
            .await
            .unwrap();
        let first_at = Utc::now();
        let approved = repo.approve_expense(e.id, "boss", first_at).await.unwrap();
        assert!(approved.approved);
        assert_eq!(approved.approved_by.as_deref(), Some("boss"));

        let err = repo
            .approve_expense(e.id, "other-boss", first_at + Duration::hours(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AlreadyApproved { .. }));

        let stored = repo.get_expense(e.id).await.unwrap().unwrap();
        assert_eq!(stored.approved_by.as_deref(), Some("boss"));
        assert_eq!(stored.approved_at.map(|t| t.timestamp()), Some(first_at.timestamp()));
    }

    #[tokio::test]
    async fn test_approve_unknown_expense() {
        let (_dir, repo) = repo().await;
        let err = repo.approve_expense(42, "boss", Utc::now()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { id: 42, .. }));
    }

    #[tokio::test]
    async fn test_append_assigns_dense_positions_per_project() {
        let (_dir, repo) = repo().await;
        for title in ["A", "B", "C"] {
            repo.append_milestone(&new_milestone(1, title)).await.unwrap();
        }
        let other = repo.append_milestone(&new_milestone(2, "X")).await.unwrap();
        assert_eq!(other.position, 0);

        let list = repo.list_milestones(1).await.unwrap();
        let positions: Vec<(String, i64)> =
            list.iter().map(|m| (m.title.clone(), m.position)).collect();
        assert_eq!(
            positions,
            [("A".into(), 0), ("B".into(), 1), ("C".into(), 2)]
        );
    }

    #[tokio::test]
    async fn test_concurrent_appends_do_not_collide() {
        let (_dir, repo) = repo().await;
        let repo = std::sync::Arc::new(repo);
        let mut handles = Vec::new();
        for i in 0..8 {
            let repo = std::sync::Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.append_milestone(&new_milestone(1, &format!("M{}", i)))
                    .await
                    .unwrap()
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        let list = repo.list_milestones(1).await.unwrap();
        assert_eq!(list.len(), 8);
        assert!(is_dense(&list));
    }

    #[tokio::test]
    async fn test_apply_positions_and_stale_plan_conflict() {
        let (_dir, repo) = repo().await;
        for title in ["A", "B", "C"] {
            repo.append_milestone(&new_milestone(1, title)).await.unwrap();
        }
        let list = repo.list_milestones(1).await.unwrap();
        let a = list[0].id;
        let plan = plan_reorder(&list, a, 2).unwrap();
        repo.apply_positions(1, &plan.changes).await.unwrap();

        let after = repo.list_milestones(1).await.unwrap();
        let titles: Vec<&str> = after.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, ["B", "C", "A"]);
        assert!(is_dense(&after));

        // Replaying the same stale plan must not write anything.
        let err = repo.apply_positions(1, &plan.changes).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        let unchanged = repo.list_milestones(1).await.unwrap();
        assert_eq!(after, unchanged);
    }

    #[tokio::test]
    async fn test_failed_change_rolls_back_earlier_writes() {
        let (_dir, repo) = repo().await;
        for title in ["A", "B", "C"] {
            repo.append_milestone(&new_milestone(1, title)).await.unwrap();
        }
        let before = repo.list_milestones(1).await.unwrap();
        let changes = [
            PositionChange {
                milestone_id: before[0].id,
                from: 0,
                to: 1,
            },
            PositionChange {
                milestone_id: before[1].id,
                from: 9,
                to: 0,
            },
        ];

        assert!(repo.apply_positions(1, &changes).await.is_err());

        let after = repo.list_milestones(1).await.unwrap();
        assert_eq!(after, before);
        assert_eq!(after[0].title, "A");
        assert!(is_dense(&after));
    }

    #[tokio::test]
    async fn test_sequencer_reorders_sqlite_store() {
        let (_dir, repo) = repo().await;
        assert!(repo.path().ends_with("sitebook.db"));
        let repo = Arc::new(repo);
        let seq = MilestoneSequencer::new(Arc::clone(&repo) as Arc<dyn MilestoneRepoPort>);
        let mut ids = Vec::new();
        for title in ["A", "B", "C"] {
            ids.push(seq.create(new_milestone(1, title)).await.unwrap().id);
        }

        let moved = seq.reorder(1, ids[0], 2).await.unwrap();
        assert_eq!(moved.writes, 3);
        let stored = seq.list(1).await.unwrap();
        let layout: Vec<(&str, i64)> = stored
            .iter()
            .map(|m| (m.title.as_str(), m.position))
            .collect();
        assert_eq!(layout, [("B", 0), ("C", 1), ("A", 2)]);

        let replay = seq.reorder(1, ids[0], 2).await.unwrap();
        assert_eq!(replay.writes, 0);
        assert_eq!(seq.list(1).await.unwrap(), stored);

        for moved in &ids {
            for target in 0..4 {
                seq.reorder(1, *moved, target).await.unwrap();
                let list = seq.list(1).await.unwrap();
                assert!(is_dense(&list));
                let at = list.iter().position(|m| m.id == *moved).unwrap();
                assert_eq!(at, target.min(2));
            }
        }
    }

    #[tokio::test]
    async fn test_delete_compacts_positions() {
        let (_dir, repo) = repo().await;
        let mut ids = Vec::new();
        for title in ["A", "B", "C", "D"] {
            ids.push(repo.append_milestone(&new_milestone(1, title)).await.unwrap().id);
        }
        let deleted = repo.delete_milestone(ids[1]).await.unwrap();
        assert_eq!(deleted.title, "B");

        let list = repo.list_milestones(1).await.unwrap();
        let positions: Vec<(&str, i64)> =
            list.iter().map(|m| (m.title.as_str(), m.position)).collect();
        assert_eq!(positions, [("A", 0), ("C", 1), ("D", 2)]);

        let appended = repo.append_milestone(&new_milestone(1, "E")).await.unwrap();
        assert_eq!(appended.position, 3);

        let err = repo.delete_milestone(ids[1]).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_progress() {
        let (_dir, repo) = repo().await;
        let m = repo.append_milestone(&new_milestone(1, "A")).await.unwrap();
        let updated = repo
            .update_progress(m.id, MilestoneStatus::InProgress, 40)
            .await
            .unwrap();
        assert_eq!(updated.status, MilestoneStatus::InProgress);
        assert_eq!(updated.progress, 40);
        assert!(repo
            .update_progress(999, MilestoneStatus::Completed, 100)
            .await
            .is_err());
    }
}
