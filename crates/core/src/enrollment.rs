//! Per-(talent, learning path) enrollment records.

use serde::{Deserialize, Serialize};

use crate::id::{EnrollmentId, LearningPathId, ProgressId, TalentId};
use crate::Time;

/// Enrollment of one talent in one learning path.
///
/// At most one record exists per (talent, learning path) pair. The record
/// holds a non-owning reference to the talent's current progress record
/// within that path; the pointer is assigned on enroll and afterwards moved
/// only by the completion cascade. It can go stale when the path's sequence
/// is edited after assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    /// Unique identifier
    pub id: EnrollmentId,

    /// The enrolled talent
    pub talent_id: TalentId,

    /// The learning path enrolled in
    pub learning_path_id: LearningPathId,

    /// The talent's current progress record within this path
    pub current_progress_id: ProgressId,

    /// Creation timestamp
    pub created_at: Time,

    /// Last update timestamp
    pub updated_at: Time,
}

impl EnrollmentRecord {
    /// Create an enrollment pointing at the given progress record.
    pub fn new(
        talent_id: TalentId,
        learning_path_id: LearningPathId,
        current_progress_id: ProgressId,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: EnrollmentId::new(),
            talent_id,
            learning_path_id,
            current_progress_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_enrollment_points_at_given_progress() {
        let talent = TalentId::new();
        let path = LearningPathId::new();
        let progress = ProgressId::new();

        let enrollment = EnrollmentRecord::new(talent, path, progress);
        assert_eq!(enrollment.talent_id, talent);
        assert_eq!(enrollment.learning_path_id, path);
        assert_eq!(enrollment.current_progress_id, progress);
    }
}
