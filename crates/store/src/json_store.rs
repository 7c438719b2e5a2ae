//! JSON file store implementation.
//!
//! Stores one pretty-printed JSON file per record. Pair uniqueness is
//! structural: the (talent, course) and (talent, learning path) indexes are
//! marker files named after the pair, so a pair can only ever resolve to
//! one record. A single async mutex spans each read-check-write, keeping
//! racing creators from writing twice.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pathway_core::{
    CourseId, CourseSequence, EnrollmentId, EnrollmentRecord, LearningPathId, ProgressId,
    ProgressRecord, ProgressStatus, TalentId,
};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::warn;

use super::{EnrollmentStore, ProgressStore, Result, SequenceSource, StoreError};

/// File-based JSON store backend.
pub struct JsonStore {
    root: PathBuf,
    guard: Mutex<()>,
}

impl JsonStore {
    /// Create a store rooted at the given directory, creating the
    /// subdirectories it needs.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("progress")).await?;
        fs::create_dir_all(root.join("progress_pairs")).await?;
        fs::create_dir_all(root.join("enrollments")).await?;
        fs::create_dir_all(root.join("enrollment_pairs")).await?;
        fs::create_dir_all(root.join("sequences")).await?;

        Ok(Self {
            root,
            guard: Mutex::new(()),
        })
    }

    /// Persist a learning path's sequence for [`SequenceSource`] lookups.
    pub async fn save_sequence(
        &self,
        learning_path_id: LearningPathId,
        sequence: &CourseSequence,
    ) -> Result<()> {
        let _guard = self.guard.lock().await;
        write_json(&self.sequence_path(learning_path_id), sequence).await
    }

    fn progress_path(&self, id: ProgressId) -> PathBuf {
        self.root.join("progress").join(format!("{}.json", id))
    }
    fn progress_pair_path(&self, talent_id: TalentId, course_id: CourseId) -> PathBuf {
        self.root
            .join("progress_pairs")
            .join(format!("{}-{}.json", talent_id, course_id))
    }
    fn enrollment_path(&self, id: EnrollmentId) -> PathBuf {
        self.root.join("enrollments").join(format!("{}.json", id))
    }
    fn enrollment_pair_path(
        &self,
        talent_id: TalentId,
        learning_path_id: LearningPathId,
    ) -> PathBuf {
        self.root
            .join("enrollment_pairs")
            .join(format!("{}-{}.json", talent_id, learning_path_id))
    }
    fn sequence_path(&self, id: LearningPathId) -> PathBuf {
        self.root.join("sequences").join(format!("{}.json", id))
    }

    async fn load_progress_for_pair(
        &self,
        talent_id: TalentId,
        course_id: CourseId,
    ) -> Result<Option<ProgressRecord>> {
        match read_json::<ProgressId>(&self.progress_pair_path(talent_id, course_id)).await? {
            Some(id) => {
                let record = read_json::<ProgressRecord>(&self.progress_path(id))
                    .await?
                    .ok_or_else(|| {
                        StoreError::NotFound(format!("progress record {} behind pair marker", id))
                    })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ProgressStore for JsonStore {
    async fn get_or_create(
        &self,
        talent_id: TalentId,
        course_id: CourseId,
    ) -> Result<ProgressRecord> {
        let _guard = self.guard.lock().await;
        if let Some(record) = self.load_progress_for_pair(talent_id, course_id).await? {
            return Ok(record);
        }

        let record = ProgressRecord::new(talent_id, course_id);
        write_json(&self.progress_path(record.id), &record).await?;
        write_json(&self.progress_pair_path(talent_id, course_id), &record.id).await?;
        Ok(record)
    }

    async fn find(
        &self,
        talent_id: TalentId,
        course_id: CourseId,
    ) -> Result<Option<ProgressRecord>> {
        self.load_progress_for_pair(talent_id, course_id).await
    }

    async fn load(&self, id: ProgressId) -> Result<Option<ProgressRecord>> {
        read_json(&self.progress_path(id)).await
    }

    async fn set_completed(&self, id: ProgressId) -> Result<ProgressRecord> {
        let _guard = self.guard.lock().await;
        let mut record = read_json::<ProgressRecord>(&self.progress_path(id))
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("progress record {}", id)))?;
        record.mark_completed(chrono::Utc::now());
        write_json(&self.progress_path(id), &record).await?;
        Ok(record)
    }

    async fn set_status(&self, id: ProgressId, status: ProgressStatus) -> Result<ProgressRecord> {
        let _guard = self.guard.lock().await;
        let mut record = read_json::<ProgressRecord>(&self.progress_path(id))
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("progress record {}", id)))?;
        record.set_status(status, chrono::Utc::now());
        write_json(&self.progress_path(id), &record).await?;
        Ok(record)
    }

    async fn delete(&self, talent_id: TalentId, course_id: CourseId) -> Result<()> {
        let _guard = self.guard.lock().await;
        let pair_path = self.progress_pair_path(talent_id, course_id);
        if let Some(id) = read_json::<ProgressId>(&pair_path).await? {
            remove_if_present(&self.progress_path(id)).await?;
        }
        remove_if_present(&pair_path).await
    }
}

#[async_trait]
impl EnrollmentStore for JsonStore {
    async fn find(
        &self,
        talent_id: TalentId,
        learning_path_id: LearningPathId,
    ) -> Result<Option<EnrollmentRecord>> {
        match read_json::<EnrollmentId>(&self.enrollment_pair_path(talent_id, learning_path_id))
            .await?
        {
            Some(id) => read_json(&self.enrollment_path(id)).await,
            None => Ok(None),
        }
    }

    async fn create(
        &self,
        talent_id: TalentId,
        learning_path_id: LearningPathId,
        current_progress_id: ProgressId,
    ) -> Result<EnrollmentRecord> {
        let _guard = self.guard.lock().await;
        let pair_path = self.enrollment_pair_path(talent_id, learning_path_id);
        if read_json::<EnrollmentId>(&pair_path).await?.is_some() {
            return Err(StoreError::Conflict(format!(
                "talent {} is already enrolled in learning path {}",
                talent_id, learning_path_id
            )));
        }

        let record = EnrollmentRecord::new(talent_id, learning_path_id, current_progress_id);
        write_json(&self.enrollment_path(record.id), &record).await?;
        write_json(&pair_path, &record.id).await?;
        Ok(record)
    }

    async fn delete(&self, talent_id: TalentId, learning_path_id: LearningPathId) -> Result<()> {
        let _guard = self.guard.lock().await;
        let pair_path = self.enrollment_pair_path(talent_id, learning_path_id);
        if let Some(id) = read_json::<EnrollmentId>(&pair_path).await? {
            remove_if_present(&self.enrollment_path(id)).await?;
        }
        remove_if_present(&pair_path).await
    }

    async fn find_all_pointing_at(
        &self,
        progress_id: ProgressId,
    ) -> Result<Vec<EnrollmentRecord>> {
        let all: Vec<EnrollmentRecord> = list_dir(&self.root.join("enrollments")).await?;
        let mut affected: Vec<EnrollmentRecord> = all
            .into_iter()
            .filter(|e| e.current_progress_id == progress_id)
            .collect();
        affected.sort_by_key(|e| e.created_at);
        Ok(affected)
    }

    async fn update_current(
        &self,
        enrollment_id: EnrollmentId,
        progress_id: ProgressId,
    ) -> Result<EnrollmentRecord> {
        let _guard = self.guard.lock().await;
        let path = self.enrollment_path(enrollment_id);
        let mut record = read_json::<EnrollmentRecord>(&path)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("enrollment {}", enrollment_id)))?;
        record.current_progress_id = progress_id;
        record.updated_at = chrono::Utc::now();
        write_json(&path, &record).await?;
        Ok(record)
    }
}

#[async_trait]
impl SequenceSource for JsonStore {
    async fn sequence(&self, learning_path_id: LearningPathId) -> Result<CourseSequence> {
        read_json(&self.sequence_path(learning_path_id))
            .await?
            .ok_or_else(|| {
                StoreError::NotFound(format!("sequence for learning path {}", learning_path_id))
            })
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json.as_bytes()).await?;
    Ok(())
}

async fn remove_if_present(path: &Path) -> Result<()> {
    fs::remove_file(path).await.or_else(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Ok(())
        } else {
            Err(e)
        }
    })?;
    Ok(())
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        match read_json(&entry.path()).await {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(e) => warn!("Skipping unreadable record {}: {}", entry.path().display(), e),
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open(dir: &tempfile::TempDir) -> JsonStore {
        JsonStore::new(dir.path()).await.unwrap()
    }

    #[tokio::test]
    async fn get_or_create_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let talent = TalentId::new();
        let course = CourseId::new();

        let store = open(&dir).await;
        let first = store.get_or_create(talent, course).await.unwrap();
        drop(store);

        let reopened = open(&dir).await;
        let second = reopened.get_or_create(talent, course).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn set_completed_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir).await;
        let record = store
            .get_or_create(TalentId::new(), CourseId::new())
            .await
            .unwrap();

        let completed = store.set_completed(record.id).await.unwrap();
        assert!(completed.status.is_completed());

        let loaded = store.load(record.id).await.unwrap().unwrap();
        assert_eq!(loaded.completed_at, completed.completed_at);

        let again = store.set_completed(record.id).await.unwrap();
        assert_eq!(again.completed_at, completed.completed_at);
    }

    #[tokio::test]
    async fn enrollment_create_conflicts_on_duplicate_pair() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir).await;
        let talent = TalentId::new();
        let path = LearningPathId::new();

        store.create(talent, path, ProgressId::new()).await.unwrap();
        let result = store.create(talent, path, ProgressId::new()).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn enrollment_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir).await;
        let talent = TalentId::new();
        let path = LearningPathId::new();

        EnrollmentStore::delete(&store, talent, path).await.unwrap();

        store.create(talent, path, ProgressId::new()).await.unwrap();
        EnrollmentStore::delete(&store, talent, path).await.unwrap();
        assert!(EnrollmentStore::find(&store, talent, path)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn find_all_pointing_at_scans_enrollments() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir).await;
        let talent = TalentId::new();
        let shared = ProgressId::new();

        let first = store
            .create(talent, LearningPathId::new(), shared)
            .await
            .unwrap();
        store
            .create(talent, LearningPathId::new(), ProgressId::new())
            .await
            .unwrap();

        let affected = store.find_all_pointing_at(shared).await.unwrap();
        assert_eq!(affected.len(), 1);
        assert_eq!(affected[0].id, first.id);
    }

    #[tokio::test]
    async fn sequence_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir).await;
        let path = LearningPathId::new();
        let sequence = CourseSequence::normalize([CourseId::new(), CourseId::new()]).unwrap();

        store.save_sequence(path, &sequence).await.unwrap();
        assert_eq!(store.sequence(path).await.unwrap(), sequence);

        let missing = store.sequence(LearningPathId::new()).await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn progress_delete_removes_record_and_marker() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir).await;
        let talent = TalentId::new();
        let course = CourseId::new();
        store.get_or_create(talent, course).await.unwrap();

        ProgressStore::delete(&store, talent, course).await.unwrap();
        ProgressStore::delete(&store, talent, course).await.unwrap();
        assert!(ProgressStore::find(&store, talent, course)
            .await
            .unwrap()
            .is_none());
    }
}
