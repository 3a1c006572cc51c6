//! Milestone sequencer. Keeps each project's milestone positions dense (`0..N-1`).
//!
//! - create appends at the end (store assigns position = count atomically)
//! - reorder plans a single drag-and-drop move and writes only the positions that changed
//! - delete removes the milestone and closes the gap

use crate::domain::{
    DisplayStatus, DomainError, Milestone, MilestoneStatus, NewMilestone, plan_reorder,
};
use crate::ports::MilestoneRepoPort;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of a reorder.
#[derive(Debug, Clone)]
pub struct ReorderOutcome {
    /// Full project ordering after the move.
    pub ordered: Vec<Milestone>,
    /// Number of position writes persisted (0 for a no-op).
    pub writes: usize,
}

pub struct MilestoneSequencer {
    repo: Arc<dyn MilestoneRepoPort>,
}

impl MilestoneSequencer {
    pub fn new(repo: Arc<dyn MilestoneRepoPort>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, new: NewMilestone) -> Result<Milestone, DomainError> {
        new.validate()?;
        let milestone = self.repo.append_milestone(&new).await?;
        info!(
            id = milestone.id,
            project_id = milestone.project_id,
            position = milestone.position,
            "milestone created"
        );
        Ok(milestone)
    }

    /// Milestones of a project in timeline order.
    pub async fn list(&self, project_id: i64) -> Result<Vec<Milestone>, DomainError> {
        self.repo.list_milestones(project_id).await
    }

    /// Milestones with their read-time status (`overdue` derived from `now`).
    pub async fn timeline(
        &self,
        project_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<(Milestone, DisplayStatus)>, DomainError> {
        Ok(self
            .repo
            .list_milestones(project_id)
            .await?
            .into_iter()
            .map(|m| {
                let status = m.display_status(now);
                (m, status)
            })
            .collect())
    }

    /// Move `moved_id` to `target_index` within its project.
    ///
    /// Unknown ids fail before anything is written. All writes of one move are applied
    /// atomically by the store; replaying the same move is a no-op with zero writes.
    pub async fn reorder(
        &self,
        project_id: i64,
        moved_id: i64,
        target_index: usize,
    ) -> Result<ReorderOutcome, DomainError> {
        let current = self.repo.list_milestones(project_id).await?;
        let plan = plan_reorder(&current, moved_id, target_index)?;

        if plan.is_noop() {
            debug!(project_id, moved_id, target_index, "reorder is a no-op");
            return Ok(ReorderOutcome {
                ordered: plan.ordered,
                writes: 0,
            });
        }

        self.repo.apply_positions(project_id, &plan.changes).await?;
        info!(
            project_id,
            moved_id,
            target_index,
            writes = plan.changes.len(),
            "milestones reordered"
        );
        Ok(ReorderOutcome {
            writes: plan.changes.len(),
            ordered: plan.ordered,
        })
    }

    /// Delete a milestone; later milestones in the project shift up by one.
    pub async fn delete(&self, id: i64) -> Result<Milestone, DomainError> {
        let deleted = self.repo.delete_milestone(id).await?;
        info!(
            id,
            project_id = deleted.project_id,
            position = deleted.position,
            "milestone deleted"
        );
        Ok(deleted)
    }

    /// Update status and/or progress. Completing a milestone sets progress to 100.
    pub async fn update_progress(
        &self,
        id: i64,
        status: Option<MilestoneStatus>,
        progress: Option<u8>,
    ) -> Result<Milestone, DomainError> {
        if progress.is_some_and(|p| p > 100) {
            return Err(DomainError::Validation(
                "Progress must be between 0 and 100".into(),
            ));
        }
        let current = self
            .repo
            .get_milestone(id)
            .await?
            .ok_or_else(|| DomainError::milestone_not_found(id))?;

        let status = status.unwrap_or(current.status);
        let progress = match status {
            MilestoneStatus::Completed => 100,
            _ => progress.unwrap_or(current.progress),
        };
        self.repo.update_progress(id, status, progress).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::MemoryRepo;
    use crate::domain::Priority;
    use crate::domain::ordering::is_dense;
    use chrono::Duration;

    async fn seeded(titles: &[&str]) -> (Arc<MemoryRepo>, MilestoneSequencer, Vec<Milestone>) {
        let repo = Arc::new(MemoryRepo::new());
        let seq = MilestoneSequencer::new(Arc::clone(&repo) as Arc<dyn MilestoneRepoPort>);
        let now = Utc::now();
        let mut created = Vec::new();
        for title in titles {
            created.push(
                seq.create(NewMilestone {
                    project_id: 1,
                    title: title.to_string(),
                    description: None,
                    starts_at: now,
                    ends_at: now + Duration::days(7),
                    priority: Priority::Medium,
                })
                .await
                .unwrap(),
            );
        }
        (repo, seq, created)
    }

    fn layout(list: &[Milestone]) -> Vec<(String, i64)> {
        list.iter().map(|m| (m.title.clone(), m.position)).collect()
    }

    #[tokio::test]
    async fn test_move_a_to_end() {
        let (repo, seq, ms) = seeded(&["A", "B", "C"]).await;

        let outcome = seq.reorder(1, ms[0].id, 2).await.unwrap();

        assert_eq!(outcome.writes, 3);
        assert_eq!(repo.position_writes(), 3);
        let stored = seq.list(1).await.unwrap();
        assert_eq!(
            layout(&stored),
            [("B".into(), 0), ("C".into(), 1), ("A".into(), 2)]
        );
        assert_eq!(layout(&outcome.ordered), layout(&stored));
    }

    #[tokio::test]
    async fn test_reorder_is_idempotent() {
        let (repo, seq, ms) = seeded(&["A", "B", "C", "D"]).await;

        let first = seq.reorder(1, ms[3].id, 0).await.unwrap();
        let writes_after_first = repo.position_writes();
        let second = seq.reorder(1, ms[3].id, 0).await.unwrap();

        assert_eq!(first.writes, 4);
        assert_eq!(second.writes, 0);
        assert_eq!(repo.position_writes(), writes_after_first);
    }

    #[tokio::test]
    async fn test_same_index_writes_nothing() {
        let (repo, seq, ms) = seeded(&["A", "B", "C"]).await;
        let outcome = seq.reorder(1, ms[1].id, 1).await.unwrap();
        assert_eq!(outcome.writes, 0);
        assert_eq!(repo.position_writes(), 0);
    }

    #[tokio::test]
    async fn test_unknown_or_foreign_milestone_is_not_found() {
        let (repo, seq, _) = seeded(&["A", "B"]).await;
        let err = seq.reorder(1, 404, 0).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));

        // A milestone of another project is not part of project 1's list.
        let now = Utc::now();
        let foreign = seq
            .create(NewMilestone {
                project_id: 2,
                title: "Z".into(),
                description: None,
                starts_at: now,
                ends_at: now,
                priority: Priority::Low,
            })
            .await
            .unwrap();
        assert!(seq.reorder(1, foreign.id, 0).await.is_err());
        assert_eq!(repo.position_writes(), 0);
    }

    #[tokio::test]
    async fn test_every_move_keeps_positions_dense() {
        let (_repo, seq, ms) = seeded(&["A", "B", "C", "D", "E"]).await;
        for moved in &ms {
            for target in 0..ms.len() + 1 {
                seq.reorder(1, moved.id, target).await.unwrap();
                let stored = seq.list(1).await.unwrap();
                assert_eq!(stored.len(), 5);
                assert!(is_dense(&stored), "{:?}", layout(&stored));
                let moved_now = stored.iter().position(|m| m.id == moved.id).unwrap();
                assert_eq!(moved_now, target.min(4));
            }
        }
    }

    #[tokio::test]
    async fn test_delete_then_create_stays_dense() {
        let (_repo, seq, ms) = seeded(&["A", "B", "C"]).await;
        seq.delete(ms[0].id).await.unwrap();
        let stored = seq.list(1).await.unwrap();
        assert_eq!(layout(&stored), [("B".into(), 0), ("C".into(), 1)]);

        let now = Utc::now();
        let d = seq
            .create(NewMilestone {
                project_id: 1,
                title: "D".into(),
                description: None,
                starts_at: now,
                ends_at: now + Duration::days(1),
                priority: Priority::Critical,
            })
            .await
            .unwrap();
        assert_eq!(d.position, 2);
    }

    #[tokio::test]
    async fn test_create_validates() {
        let (_repo, seq, _) = seeded(&[]).await;
        let now = Utc::now();
        let err = seq
            .create(NewMilestone {
                project_id: 1,
                title: "Backwards".into(),
                description: None,
                starts_at: now,
                ends_at: now - Duration::days(1),
                priority: Priority::Low,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_progress_and_timeline() {
        let (_repo, seq, ms) = seeded(&["A", "B"]).await;

        assert!(seq.update_progress(ms[0].id, None, Some(101)).await.is_err());

        let a = seq
            .update_progress(ms[0].id, Some(MilestoneStatus::InProgress), Some(30))
            .await
            .unwrap();
        assert_eq!(a.progress, 30);
        let b = seq
            .update_progress(ms[1].id, Some(MilestoneStatus::Completed), Some(10))
            .await
            .unwrap();
        assert_eq!(b.progress, 100);

        let later = Utc::now() + Duration::days(30);
        let timeline = seq.timeline(1, later).await.unwrap();
        let statuses: Vec<DisplayStatus> = timeline.iter().map(|(_, s)| *s).collect();
        assert_eq!(statuses, [DisplayStatus::Overdue, DisplayStatus::Completed]);
    }
}
