//! In-memory store implementation.
//!
//! Keeps every table behind a single async mutex, which makes the
//! pair-indexed create operations atomic. Reference backend for engine
//! tests and embedded use.

use std::collections::HashMap;

use async_trait::async_trait;
use pathway_core::{
    CourseId, CourseSequence, EnrollmentId, EnrollmentRecord, LearningPathId, ProgressId,
    ProgressRecord, ProgressStatus, TalentId,
};
use tokio::sync::Mutex;

use super::{EnrollmentStore, ProgressStore, Result, SequenceSource, StoreError};

#[derive(Default)]
struct Inner {
    progress: HashMap<ProgressId, ProgressRecord>,
    progress_pairs: HashMap<(TalentId, CourseId), ProgressId>,
    enrollments: HashMap<EnrollmentId, EnrollmentRecord>,
    enrollment_pairs: HashMap<(TalentId, LearningPathId), EnrollmentId>,
    sequences: HashMap<LearningPathId, CourseSequence>,
}

/// In-memory store backend.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a learning path's sequence.
    pub async fn put_sequence(&self, learning_path_id: LearningPathId, sequence: CourseSequence) {
        self.inner
            .lock()
            .await
            .sequences
            .insert(learning_path_id, sequence);
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn get_or_create(
        &self,
        talent_id: TalentId,
        course_id: CourseId,
    ) -> Result<ProgressRecord> {
        let mut inner = self.inner.lock().await;
        if let Some(id) = inner.progress_pairs.get(&(talent_id, course_id)) {
            let record = inner
                .progress
                .get(id)
                .ok_or_else(|| StoreError::NotFound(format!("progress record {}", id)))?;
            return Ok(record.clone());
        }

        let record = ProgressRecord::new(talent_id, course_id);
        inner.progress_pairs.insert((talent_id, course_id), record.id);
        inner.progress.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find(
        &self,
        talent_id: TalentId,
        course_id: CourseId,
    ) -> Result<Option<ProgressRecord>> {
        let inner = self.inner.lock().await;
        let record = inner
            .progress_pairs
            .get(&(talent_id, course_id))
            .and_then(|id| inner.progress.get(id))
            .cloned();
        Ok(record)
    }

    async fn load(&self, id: ProgressId) -> Result<Option<ProgressRecord>> {
        Ok(self.inner.lock().await.progress.get(&id).cloned())
    }

    async fn set_completed(&self, id: ProgressId) -> Result<ProgressRecord> {
        let mut inner = self.inner.lock().await;
        let record = inner
            .progress
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("progress record {}", id)))?;
        record.mark_completed(chrono::Utc::now());
        Ok(record.clone())
    }

    async fn set_status(&self, id: ProgressId, status: ProgressStatus) -> Result<ProgressRecord> {
        let mut inner = self.inner.lock().await;
        let record = inner
            .progress
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("progress record {}", id)))?;
        record.set_status(status, chrono::Utc::now());
        Ok(record.clone())
    }

    async fn delete(&self, talent_id: TalentId, course_id: CourseId) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(id) = inner.progress_pairs.remove(&(talent_id, course_id)) {
            inner.progress.remove(&id);
        }
        Ok(())
    }
}

#[async_trait]
impl EnrollmentStore for MemoryStore {
    async fn find(
        &self,
        talent_id: TalentId,
        learning_path_id: LearningPathId,
    ) -> Result<Option<EnrollmentRecord>> {
        let inner = self.inner.lock().await;
        let record = inner
            .enrollment_pairs
            .get(&(talent_id, learning_path_id))
            .and_then(|id| inner.enrollments.get(id))
            .cloned();
        Ok(record)
    }

    async fn create(
        &self,
        talent_id: TalentId,
        learning_path_id: LearningPathId,
        current_progress_id: ProgressId,
    ) -> Result<EnrollmentRecord> {
        let mut inner = self.inner.lock().await;
        if inner
            .enrollment_pairs
            .contains_key(&(talent_id, learning_path_id))
        {
            return Err(StoreError::Conflict(format!(
                "talent {} is already enrolled in learning path {}",
                talent_id, learning_path_id
            )));
        }

        let record = EnrollmentRecord::new(talent_id, learning_path_id, current_progress_id);
        inner
            .enrollment_pairs
            .insert((talent_id, learning_path_id), record.id);
        inner.enrollments.insert(record.id, record.clone());
        Ok(record)
    }

    async fn delete(&self, talent_id: TalentId, learning_path_id: LearningPathId) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(id) = inner
            .enrollment_pairs
            .remove(&(talent_id, learning_path_id))
        {
            inner.enrollments.remove(&id);
        }
        Ok(())
    }

    async fn find_all_pointing_at(
        &self,
        progress_id: ProgressId,
    ) -> Result<Vec<EnrollmentRecord>> {
        let inner = self.inner.lock().await;
        let mut affected: Vec<EnrollmentRecord> = inner
            .enrollments
            .values()
            .filter(|e| e.current_progress_id == progress_id)
            .cloned()
            .collect();
        affected.sort_by_key(|e| e.created_at);
        Ok(affected)
    }

    async fn update_current(
        &self,
        enrollment_id: EnrollmentId,
        progress_id: ProgressId,
    ) -> Result<EnrollmentRecord> {
        let mut inner = self.inner.lock().await;
        let record = inner
            .enrollments
            .get_mut(&enrollment_id)
            .ok_or_else(|| StoreError::NotFound(format!("enrollment {}", enrollment_id)))?;
        record.current_progress_id = progress_id;
        record.updated_at = chrono::Utc::now();
        Ok(record.clone())
    }
}

#[async_trait]
impl SequenceSource for MemoryStore {
    async fn sequence(&self, learning_path_id: LearningPathId) -> Result<CourseSequence> {
        self.inner
            .lock()
            .await
            .sequences
            .get(&learning_path_id)
            .cloned()
            .ok_or_else(|| {
                StoreError::NotFound(format!("sequence for learning path {}", learning_path_id))
            })
    }
}
