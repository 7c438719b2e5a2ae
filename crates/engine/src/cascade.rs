//! Completion cascade fan-out.
//!
//! When a progress record reaches `Completed`, every enrollment pointing at
//! it is re-resolved against its own path's sequence. The fan-out is an
//! explicit list of per-enrollment commands so that partial failure stays
//! visible to the caller instead of disappearing inside a bulk write.

use pathway_core::{CourseId, EnrollmentId, LearningPathId, ProgressId, TalentId};
use pathway_store::StoreError;

/// Command to re-resolve one enrollment's current course.
///
/// One command is materialized per enrollment affected by a completion;
/// each is applied independently of the others.
#[derive(Debug, Clone)]
pub struct ReassignCurrent {
    /// The enrollment to update
    pub enrollment_id: EnrollmentId,

    /// The enrolled talent
    pub talent_id: TalentId,

    /// The learning path whose sequence governs the re-resolution
    pub learning_path_id: LearningPathId,
}

/// One enrollment the cascade could not update.
#[derive(Debug)]
pub struct CascadeFailure {
    /// The enrollment whose update failed
    pub enrollment_id: EnrollmentId,

    /// Why the update failed
    pub error: StoreError,
}

/// Outcome of one completion cascade.
///
/// Partial success is a valid terminal state: a failed enrollment update
/// never blocks the remaining enrollments, and the caller decides how to
/// surface the failures.
#[derive(Debug)]
pub struct CascadeReport {
    /// The progress record that reached `Completed`
    pub progress_id: ProgressId,

    /// The course that was completed
    pub course_id: CourseId,

    /// Enrollments whose current pointer moved to a new record
    pub reassigned: Vec<EnrollmentId>,

    /// Enrollments visited but left unchanged because no candidate course
    /// followed the completed one in their sequence
    pub unchanged: Vec<EnrollmentId>,

    /// Enrollments whose update failed
    pub failures: Vec<CascadeFailure>,
}

impl CascadeReport {
    pub(crate) fn new(progress_id: ProgressId, course_id: CourseId) -> Self {
        Self {
            progress_id,
            course_id,
            reassigned: Vec::new(),
            unchanged: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Whether every affected enrollment was processed without error.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total number of enrollments the cascade touched.
    pub fn affected(&self) -> usize {
        self.reassigned.len() + self.unchanged.len() + self.failures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_clean() {
        let report = CascadeReport::new(ProgressId::new(), CourseId::new());
        assert!(report.is_clean());
        assert_eq!(report.affected(), 0);
    }

    #[test]
    fn failures_make_report_dirty() {
        let mut report = CascadeReport::new(ProgressId::new(), CourseId::new());
        report.reassigned.push(EnrollmentId::new());
        report.failures.push(CascadeFailure {
            enrollment_id: EnrollmentId::new(),
            error: StoreError::Other("boom".to_string()),
        });

        assert!(!report.is_clean());
        assert_eq!(report.affected(), 2);
    }
}
