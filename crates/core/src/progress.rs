//! Per-(talent, course) progress records.

use serde::{Deserialize, Serialize};

use crate::id::{CourseId, ProgressId, TalentId};
use crate::Time;

/// Status of one talent on one course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    /// Record exists but the talent has not begun the course
    NotStarted,

    /// The talent is working through the course
    InProgress,

    /// The talent finished the course
    Completed,
}

impl ProgressStatus {
    /// Whether this status is `Completed`.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Progress of one talent on one course.
///
/// At most one record exists per (talent, course) pair. Records are created
/// lazily the first time the resolution scan touches the pair and are never
/// deleted by the engine, so a talent's history survives path edits and
/// re-enrollment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Unique identifier
    pub id: ProgressId,

    /// The talent this record belongs to
    pub talent_id: TalentId,

    /// The course being tracked
    pub course_id: CourseId,

    /// Current status
    pub status: ProgressStatus,

    /// When the course was completed, if it was
    pub completed_at: Option<Time>,

    /// Creation timestamp
    pub created_at: Time,

    /// Last update timestamp
    pub updated_at: Time,
}

impl ProgressRecord {
    /// Create a fresh `NotStarted` record for a (talent, course) pair.
    pub fn new(talent_id: TalentId, course_id: CourseId) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: ProgressId::new(),
            talent_id,
            course_id,
            status: ProgressStatus::NotStarted,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition into `Completed` and stamp `completed_at`.
    ///
    /// Idempotent: a record that is already `Completed` keeps its original
    /// completion timestamp.
    pub fn mark_completed(&mut self, now: Time) {
        if self.status.is_completed() {
            return;
        }
        self.status = ProgressStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    /// Apply a status write from outside the engine.
    ///
    /// A write into `Completed` behaves exactly like
    /// [`ProgressRecord::mark_completed`]; other statuses are recorded
    /// as-is and leave `completed_at` alone. A direct `NotStarted` to
    /// `Completed` jump is accepted.
    pub fn set_status(&mut self, status: ProgressStatus, now: Time) {
        if status.is_completed() {
            self.mark_completed(now);
            return;
        }
        self.status = status;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_is_not_started() {
        let record = ProgressRecord::new(TalentId::new(), CourseId::new());
        assert_eq!(record.status, ProgressStatus::NotStarted);
        assert!(record.completed_at.is_none());
    }

    #[test]
    fn mark_completed_stamps_timestamp_once() {
        let mut record = ProgressRecord::new(TalentId::new(), CourseId::new());

        let first = chrono::Utc::now();
        record.mark_completed(first);
        assert!(record.status.is_completed());
        assert_eq!(record.completed_at, Some(first));

        let later = first + chrono::Duration::hours(1);
        record.mark_completed(later);
        assert_eq!(record.completed_at, Some(first));
    }

    #[test]
    fn set_status_routes_completed_through_mark_completed() {
        let mut record = ProgressRecord::new(TalentId::new(), CourseId::new());
        let now = chrono::Utc::now();

        record.set_status(ProgressStatus::InProgress, now);
        assert_eq!(record.status, ProgressStatus::InProgress);
        assert!(record.completed_at.is_none());

        record.set_status(ProgressStatus::Completed, now);
        assert!(record.status.is_completed());
        assert_eq!(record.completed_at, Some(now));
    }
}
