//! Milestone position ordering. Pure computation; persistence happens in the store.
//!
//! Positions are zero-based and dense: a project with N milestones holds exactly
//! `{0, 1, ..., N-1}`.

use super::entities::Milestone;
use super::errors::DomainError;
use serde::Serialize;

/// A single position write. `from` is the position the plan was computed against, so stores can
/// refuse the write if the row moved in the meantime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionChange {
    pub milestone_id: i64,
    pub from: i64,
    pub to: i64,
}

/// Result of planning a drag-and-drop move.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderPlan {
    /// Full new ordering with `position` already rewritten.
    pub ordered: Vec<Milestone>,
    /// Only the milestones whose position actually changed.
    pub changes: Vec<PositionChange>,
}

impl ReorderPlan {
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Plans moving `moved_id` to `target_index` within `current` (sorted by position ascending).
///
/// A target past the end is clamped to the last slot. Moving to the current index yields an
/// empty change set. An unknown id fails without producing a partial plan.
pub fn plan_reorder(
    current: &[Milestone],
    moved_id: i64,
    target_index: usize,
) -> Result<ReorderPlan, DomainError> {
    let from_index = current
        .iter()
        .position(|m| m.id == moved_id)
        .ok_or_else(|| DomainError::milestone_not_found(moved_id))?;
    let target_index = target_index.min(current.len().saturating_sub(1));

    if from_index == target_index {
        return Ok(ReorderPlan {
            ordered: current.to_vec(),
            changes: Vec::new(),
        });
    }

    let mut ordered = current.to_vec();
    let moved = ordered.remove(from_index);
    ordered.insert(target_index, moved);

    let changes = assign_dense_positions(&mut ordered);
    Ok(ReorderPlan { ordered, changes })
}

/// Rewrites `position = index` for every entry and returns the entries that changed.
pub fn assign_dense_positions(ordered: &mut [Milestone]) -> Vec<PositionChange> {
    let mut changes = Vec::new();
    for (index, milestone) in ordered.iter_mut().enumerate() {
        let to = index as i64;
        if milestone.position != to {
            changes.push(PositionChange {
                milestone_id: milestone.id,
                from: milestone.position,
                to,
            });
            milestone.position = to;
        }
    }
    changes
}

/// True when positions are exactly `{0..N-1}` with no gaps or duplicates.
pub fn is_dense(milestones: &[Milestone]) -> bool {
    let mut positions: Vec<i64> = milestones.iter().map(|m| m.position).collect();
    positions.sort_unstable();
    positions.iter().enumerate().all(|(i, &p)| p == i as i64)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::entities::{MilestoneStatus, Priority};
    use chrono::{Duration, Utc};

    pub(crate) fn milestones(titles: &[&str]) -> Vec<Milestone> {
        let now = Utc::now();
        titles
            .iter()
            .enumerate()
            .map(|(i, t)| Milestone {
                id: i as i64 + 1,
                project_id: 7,
                title: t.to_string(),
                description: None,
                starts_at: now,
                ends_at: now + Duration::days(30),
                status: MilestoneStatus::Pending,
                priority: Priority::Medium,
                progress: 0,
                position: i as i64,
            })
            .collect()
    }

    fn titles(ms: &[Milestone]) -> Vec<&str> {
        ms.iter().map(|m| m.title.as_str()).collect()
    }

    #[test]
    fn test_move_first_to_last() {
        let list = milestones(&["A", "B", "C"]);
        let plan = plan_reorder(&list, 1, 2).unwrap();

        assert_eq!(titles(&plan.ordered), ["B", "C", "A"]);
        let positions: Vec<(&str, i64)> = plan
            .ordered
            .iter()
            .map(|m| (m.title.as_str(), m.position))
            .collect();
        assert_eq!(positions, [("B", 0), ("C", 1), ("A", 2)]);
        assert_eq!(plan.changes.len(), 3);
        assert!(is_dense(&plan.ordered));
    }

    #[test]
    fn test_move_only_touches_shifted_range() {
        let list = milestones(&["A", "B", "C", "D", "E"]);
        // Move D (index 3) to index 1: B, C shift down; A and E untouched.
        let plan = plan_reorder(&list, 4, 1).unwrap();
        assert_eq!(titles(&plan.ordered), ["A", "D", "B", "C", "E"]);
        let changed: Vec<i64> = plan.changes.iter().map(|c| c.milestone_id).collect();
        assert_eq!(changed, [4, 2, 3]);
        assert!(plan.changes.iter().all(|c| c.from != c.to));
    }

    #[test]
    fn test_same_index_is_noop() {
        let list = milestones(&["A", "B", "C"]);
        let plan = plan_reorder(&list, 2, 1).unwrap();
        assert!(plan.is_noop());
        assert_eq!(plan.ordered, list);
    }

    #[test]
    fn test_replaying_move_on_result_is_noop() {
        let list = milestones(&["A", "B", "C", "D"]);
        let first = plan_reorder(&list, 1, 3).unwrap();
        assert!(!first.is_noop());
        let second = plan_reorder(&first.ordered, 1, 3).unwrap();
        assert!(second.is_noop());
    }

    #[test]
    fn test_unknown_id_fails() {
        let list = milestones(&["A", "B"]);
        let err = plan_reorder(&list, 99, 0).unwrap_err();
        assert!(matches!(err, DomainError::NotFound { id: 99, .. }));
    }

    #[test]
    fn test_target_past_end_is_clamped() {
        let list = milestones(&["A", "B", "C"]);
        let plan = plan_reorder(&list, 1, 40).unwrap();
        assert_eq!(titles(&plan.ordered), ["B", "C", "A"]);
        assert!(is_dense(&plan.ordered));
    }

    #[test]
    fn test_is_dense_detects_gaps_and_duplicates() {
        let mut list = milestones(&["A", "B", "C"]);
        assert!(is_dense(&list));
        list[2].position = 5;
        assert!(!is_dense(&list));
        list[2].position = 1;
        assert!(!is_dense(&list));
    }
}
