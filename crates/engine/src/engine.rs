//! Progression service.

use std::sync::Arc;

use async_trait::async_trait;
use pathway_core::{
    CourseId, CourseSequence, EnrollmentRecord, LearningPathId, ProgressId, ProgressRecord,
    TalentId,
};
use pathway_store::{EnrollmentStore, ProgressStore, Result, SequenceSource, StoreError};
use tracing::{debug, info, warn};

use crate::cascade::{CascadeFailure, CascadeReport, ReassignCurrent};

/// Progression service exposed to the course/path management layer.
#[async_trait]
pub trait ProgressionEngine: Send + Sync {
    /// Enroll a talent into a learning path.
    ///
    /// Resolves the talent's starting course within the given sequence and
    /// creates the enrollment pointing at it. Fails with
    /// [`StoreError::Conflict`] when the talent is already enrolled.
    async fn enroll(
        &self,
        learning_path_id: LearningPathId,
        sequence: &CourseSequence,
        talent_id: TalentId,
    ) -> Result<EnrollmentRecord>;

    /// Remove a talent's enrollment.
    ///
    /// Succeeds whether or not an enrollment existed. Progress records are
    /// left untouched, so re-enrolling later resumes from them.
    async fn unenroll(&self, learning_path_id: LearningPathId, talent_id: TalentId) -> Result<()>;

    /// React to a progress record reaching `Completed`.
    ///
    /// Called by the course-update flow exactly once per transition into
    /// `Completed`. Marks the record completed, then re-resolves the
    /// current pointer of every enrollment that was pointing at it, each
    /// against its own path's sequence.
    async fn on_course_completed(
        &self,
        progress_id: ProgressId,
        course_id: CourseId,
    ) -> Result<CascadeReport>;

    /// Read one enrollment together with its current progress record.
    async fn enrollment_snapshot(
        &self,
        talent_id: TalentId,
        learning_path_id: LearningPathId,
    ) -> Result<EnrollmentSnapshot>;
}

/// An enrollment paired with its current progress record, for presentation.
#[derive(Debug, Clone)]
pub struct EnrollmentSnapshot {
    /// The enrollment
    pub enrollment: EnrollmentRecord,

    /// The progress record the enrollment currently points at
    pub current_progress: ProgressRecord,
}

/// Basic progression engine implementation.
pub struct BasicProgressionEngine<P, E, S> {
    progress: Arc<P>,
    enrollments: Arc<E>,
    sequences: Arc<S>,
}

impl<P, E, S> BasicProgressionEngine<P, E, S>
where
    P: ProgressStore + 'static,
    E: EnrollmentStore + 'static,
    S: SequenceSource + 'static,
{
    /// Create a new engine over the given stores.
    pub fn new(progress: Arc<P>, enrollments: Arc<E>, sequences: Arc<S>) -> Self {
        Self {
            progress,
            enrollments,
            sequences,
        }
    }

    /// Resolve which course is available next for a talent within a
    /// sequence.
    ///
    /// Two-phase scan:
    /// 1. With `skip_until` set, scanning starts immediately after that
    ///    course. When the course is no longer a member of the sequence,
    ///    nothing is visited and no candidate is returned.
    /// 2. Walking forward, each visited course's progress record is
    ///    created on first touch. The first non-completed record ends the
    ///    scan; no records are created past it. When every visited record
    ///    is completed the last one is the candidate, representing a
    ///    talent that has finished the path.
    pub async fn resolve_available_course(
        &self,
        sequence: &CourseSequence,
        talent_id: TalentId,
        skip_until: Option<CourseId>,
    ) -> Result<Option<ProgressRecord>> {
        let tail = match skip_until {
            None => sequence.courses(),
            Some(target) => match sequence.tail_after(target) {
                Some(tail) => tail,
                None => {
                    debug!(
                        "course {} is no longer part of the sequence, nothing to resolve",
                        target
                    );
                    return Ok(None);
                }
            },
        };

        let mut last_visited = None;
        for &course_id in tail {
            let record = self.progress.get_or_create(talent_id, course_id).await?;
            if !record.status.is_completed() {
                return Ok(Some(record));
            }
            last_visited = Some(record);
        }
        Ok(last_visited)
    }

    async fn apply_reassign(
        &self,
        command: &ReassignCurrent,
        completed_course: CourseId,
    ) -> Result<Option<ProgressRecord>> {
        let sequence = self.sequences.sequence(command.learning_path_id).await?;
        let next = self
            .resolve_available_course(&sequence, command.talent_id, Some(completed_course))
            .await?;

        match next {
            Some(record) => {
                self.enrollments
                    .update_current(command.enrollment_id, record.id)
                    .await?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<P, E, S> ProgressionEngine for BasicProgressionEngine<P, E, S>
where
    P: ProgressStore + 'static,
    E: EnrollmentStore + 'static,
    S: SequenceSource + 'static,
{
    async fn enroll(
        &self,
        learning_path_id: LearningPathId,
        sequence: &CourseSequence,
        talent_id: TalentId,
    ) -> Result<EnrollmentRecord> {
        if self
            .enrollments
            .find(talent_id, learning_path_id)
            .await?
            .is_some()
        {
            return Err(StoreError::Conflict(format!(
                "talent {} is already enrolled in learning path {}",
                talent_id, learning_path_id
            )));
        }

        // A sequence holds at least one course, so the unskipped scan
        // always visits a record.
        let current = match self
            .resolve_available_course(sequence, talent_id, None)
            .await?
        {
            Some(record) => record,
            None => unreachable!("course sequences are non-empty"),
        };

        let enrollment = self
            .enrollments
            .create(talent_id, learning_path_id, current.id)
            .await?;
        info!(
            "enrolled talent {} in learning path {} starting at course {}",
            talent_id, learning_path_id, current.course_id
        );
        Ok(enrollment)
    }

    async fn unenroll(&self, learning_path_id: LearningPathId, talent_id: TalentId) -> Result<()> {
        self.enrollments.delete(talent_id, learning_path_id).await?;
        info!(
            "unenrolled talent {} from learning path {}",
            talent_id, learning_path_id
        );
        Ok(())
    }

    async fn on_course_completed(
        &self,
        progress_id: ProgressId,
        course_id: CourseId,
    ) -> Result<CascadeReport> {
        self.progress.set_completed(progress_id).await?;

        let affected = self.enrollments.find_all_pointing_at(progress_id).await?;
        let commands: Vec<ReassignCurrent> = affected
            .iter()
            .map(|e| ReassignCurrent {
                enrollment_id: e.id,
                talent_id: e.talent_id,
                learning_path_id: e.learning_path_id,
            })
            .collect();
        debug!(
            "completion of progress {} fans out to {} enrollment(s)",
            progress_id,
            commands.len()
        );

        let mut report = CascadeReport::new(progress_id, course_id);
        for command in &commands {
            match self.apply_reassign(command, course_id).await {
                Ok(Some(next)) => {
                    debug!(
                        "enrollment {} advanced to course {}",
                        command.enrollment_id, next.course_id
                    );
                    report.reassigned.push(command.enrollment_id);
                }
                Ok(None) => report.unchanged.push(command.enrollment_id),
                Err(error) => {
                    warn!(
                        "failed to advance enrollment {}: {}",
                        command.enrollment_id, error
                    );
                    report.failures.push(CascadeFailure {
                        enrollment_id: command.enrollment_id,
                        error,
                    });
                }
            }
        }

        info!(
            "course {} completed: {} enrollment(s) advanced, {} unchanged, {} failed",
            course_id,
            report.reassigned.len(),
            report.unchanged.len(),
            report.failures.len()
        );
        Ok(report)
    }

    async fn enrollment_snapshot(
        &self,
        talent_id: TalentId,
        learning_path_id: LearningPathId,
    ) -> Result<EnrollmentSnapshot> {
        let enrollment = self
            .enrollments
            .find(talent_id, learning_path_id)
            .await?
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "enrollment for talent {} in learning path {}",
                    talent_id, learning_path_id
                ))
            })?;
        let current_progress = self
            .progress
            .load(enrollment.current_progress_id)
            .await?
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "progress record {}",
                    enrollment.current_progress_id
                ))
            })?;
        Ok(EnrollmentSnapshot {
            enrollment,
            current_progress,
        })
    }
}
