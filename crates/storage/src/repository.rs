use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use pcteacher_core::grading::GradeOutcome;
use pcteacher_core::model::{
    LearnerId, LearnerProgressRecord, ModuleId, ModuleProgress, ProgressDataError,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<ProgressDataError> for StorageError {
    fn from(err: ProgressDataError) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Persisted shape of one learner's progress in one module.
///
/// Mirrors the domain `ModuleProgress` plus its keys, so repositories can
/// serialize rows without leaking storage concerns into the domain layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRow {
    pub learner_id: LearnerId,
    pub module: ModuleId,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProgressRow {
    #[must_use]
    pub fn from_progress(
        learner_id: LearnerId,
        module: ModuleId,
        progress: &ModuleProgress,
    ) -> Self {
        Self {
            learner_id,
            module,
            correct_count: progress.correct_count(),
            incorrect_count: progress.incorrect_count(),
            completed: progress.is_completed(),
            completed_at: progress.completed_at(),
        }
    }

    /// Convert the row back into domain progress.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for inconsistent rows (a
    /// completion timestamp without the completed flag).
    pub fn into_progress(self) -> Result<ModuleProgress, StorageError> {
        Ok(ModuleProgress::from_persisted(
            self.module,
            self.correct_count,
            self.incorrect_count,
            self.completed,
            self.completed_at,
        )?)
    }
}

/// Persistence contract for learner progress records.
///
/// `increment_answer` and `complete_module` are the atomic per-field
/// primitives: two concurrent correct answers for the same learner and
/// module must both count, and completion must stay one-way, without any
/// read-modify-write window at the caller.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Persist a freshly enrolled learner's zeroed record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the learner already has a record.
    async fn create_record(
        &self,
        learner: LearnerId,
        record: &LearnerProgressRecord,
    ) -> Result<(), StorageError>;

    /// Load the full record for a learner.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the learner was never enrolled.
    async fn load_record(&self, learner: LearnerId) -> Result<LearnerProgressRecord, StorageError>;

    /// Persist the whole record, overwriting per-module rows.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the learner was never enrolled.
    async fn save_record(
        &self,
        learner: LearnerId,
        record: &LearnerProgressRecord,
    ) -> Result<(), StorageError>;

    /// Atomically count one graded answer and return the post-increment row.
    ///
    /// A no-op returning the current row when the module is already
    /// completed, so counters never move after completion.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the learner has no row for the
    /// module.
    async fn increment_answer(
        &self,
        learner: LearnerId,
        module: ModuleId,
        outcome: GradeOutcome,
    ) -> Result<ModuleProgress, StorageError>;

    /// Atomically flip a module to completed, keeping the first timestamp.
    ///
    /// Idempotent; returns the resulting row.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the learner has no row for the
    /// module.
    async fn complete_module(
        &self,
        learner: LearnerId,
        module: ModuleId,
        at: DateTime<Utc>,
    ) -> Result<ModuleProgress, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    records: Arc<Mutex<HashMap<LearnerId, BTreeMap<ModuleId, ModuleProgress>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<
        std::sync::MutexGuard<'_, HashMap<LearnerId, BTreeMap<ModuleId, ModuleProgress>>>,
        StorageError,
    > {
        self.records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn record_from_modules(modules: &BTreeMap<ModuleId, ModuleProgress>) -> LearnerProgressRecord {
    let mut record = LearnerProgressRecord::default();
    for (module, progress) in modules {
        record.apply_module(*module, progress.clone());
    }
    record
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn create_record(
        &self,
        learner: LearnerId,
        record: &LearnerProgressRecord,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&learner) {
            return Err(StorageError::Conflict);
        }
        let modules = record
            .iter()
            .map(|(module, progress)| (module, progress.clone()))
            .collect();
        guard.insert(learner, modules);
        Ok(())
    }

    async fn load_record(&self, learner: LearnerId) -> Result<LearnerProgressRecord, StorageError> {
        let guard = self.lock()?;
        let modules = guard.get(&learner).ok_or(StorageError::NotFound)?;
        Ok(record_from_modules(modules))
    }

    async fn save_record(
        &self,
        learner: LearnerId,
        record: &LearnerProgressRecord,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let modules = guard.get_mut(&learner).ok_or(StorageError::NotFound)?;
        for (module, progress) in record.iter() {
            modules.insert(module, progress.clone());
        }
        Ok(())
    }

    async fn increment_answer(
        &self,
        learner: LearnerId,
        module: ModuleId,
        outcome: GradeOutcome,
    ) -> Result<ModuleProgress, StorageError> {
        let mut guard = self.lock()?;
        let modules = guard.get_mut(&learner).ok_or(StorageError::NotFound)?;
        let progress = modules.get_mut(&module).ok_or(StorageError::NotFound)?;
        progress.record_answer(outcome);
        Ok(progress.clone())
    }

    async fn complete_module(
        &self,
        learner: LearnerId,
        module: ModuleId,
        at: DateTime<Utc>,
    ) -> Result<ModuleProgress, StorageError> {
        let mut guard = self.lock()?;
        let modules = guard.get_mut(&learner).ok_or(StorageError::NotFound)?;
        let progress = modules.get_mut(&module).ok_or(StorageError::NotFound)?;
        progress.mark_completed(at);
        Ok(progress.clone())
    }
}

/// Aggregates the progress repository behind a trait object for easy
/// backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            progress: Arc::new(InMemoryRepository::new()),
        }
    }
}
