//! Store trait abstractions.

use async_trait::async_trait;
use pathway_core::{
    CourseId, CourseSequence, EnrollmentId, EnrollmentRecord, LearningPathId, ProgressId,
    ProgressRecord, ProgressStatus, TalentId,
};

/// Error type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A record already exists for the pair
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Persistence contract for per-(talent, course) progress records.
///
/// Implementations must uphold the unique-pair invariant: at most one
/// record per (talent, course), even when concurrent callers race on the
/// first access to a pair.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Return the record for the pair, creating a `NotStarted` one when
    /// none exists yet.
    ///
    /// Create-or-fetch, not create-then-fail: concurrent first access for
    /// the same pair leaves exactly one record behind.
    async fn get_or_create(
        &self,
        talent_id: TalentId,
        course_id: CourseId,
    ) -> Result<ProgressRecord>;

    /// Look up the record for a pair without creating one.
    async fn find(&self, talent_id: TalentId, course_id: CourseId)
        -> Result<Option<ProgressRecord>>;

    /// Load a record by id.
    async fn load(&self, id: ProgressId) -> Result<Option<ProgressRecord>>;

    /// Transition the record into `Completed`, stamping `completed_at`.
    ///
    /// Succeeds without change when the record is already `Completed`.
    async fn set_completed(&self, id: ProgressId) -> Result<ProgressRecord>;

    /// Apply a status write from the course-update flow.
    ///
    /// Writes into `Completed` behave exactly like
    /// [`ProgressStore::set_completed`]; callers making that transition are
    /// expected to go through the engine so the completion cascade runs.
    async fn set_status(&self, id: ProgressId, status: ProgressStatus) -> Result<ProgressRecord>;

    /// Delete the record for a pair. Succeeds whether or not one existed.
    ///
    /// The engine never calls this; it exists for the course-update flow.
    async fn delete(&self, talent_id: TalentId, course_id: CourseId) -> Result<()>;
}

/// Persistence contract for per-(talent, learning path) enrollments.
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Look up the enrollment for a pair.
    async fn find(
        &self,
        talent_id: TalentId,
        learning_path_id: LearningPathId,
    ) -> Result<Option<EnrollmentRecord>>;

    /// Create an enrollment pointing at the given progress record.
    ///
    /// Fails with [`StoreError::Conflict`] when the pair already has one.
    async fn create(
        &self,
        talent_id: TalentId,
        learning_path_id: LearningPathId,
        current_progress_id: ProgressId,
    ) -> Result<EnrollmentRecord>;

    /// Delete the enrollment for a pair. Succeeds whether or not one
    /// existed.
    async fn delete(&self, talent_id: TalentId, learning_path_id: LearningPathId) -> Result<()>;

    /// Every enrollment, across all talents and paths, whose current
    /// pointer equals the given progress record.
    ///
    /// Used only by the completion cascade.
    async fn find_all_pointing_at(
        &self,
        progress_id: ProgressId,
    ) -> Result<Vec<EnrollmentRecord>>;

    /// Move an enrollment's current pointer to another progress record.
    async fn update_current(
        &self,
        enrollment_id: EnrollmentId,
        progress_id: ProgressId,
    ) -> Result<EnrollmentRecord>;
}

/// Lookup for a learning path's course sequence.
///
/// The sequence is owned by the learning-path layer; the engine only reads
/// it, once per enrollment per resolution.
#[async_trait]
pub trait SequenceSource: Send + Sync {
    /// The current sequence of the given learning path.
    async fn sequence(&self, learning_path_id: LearningPathId) -> Result<CourseSequence>;
}
