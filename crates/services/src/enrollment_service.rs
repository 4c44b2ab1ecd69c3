use std::sync::Arc;

use pcteacher_core::model::{Catalog, LearnerId, LearnerProgressRecord};
use storage::repository::{ProgressRepository, StorageError};

use crate::error::EnrollmentError;

/// Creates the zeroed progress record when an account is registered.
///
/// The record covers every catalog module from day one; the first module is
/// unlocked immediately by derivation, everything else waits on the chain.
#[derive(Clone)]
pub struct EnrollmentService {
    catalog: Catalog,
    repo: Arc<dyn ProgressRepository>,
}

impl EnrollmentService {
    #[must_use]
    pub fn new(catalog: Catalog, repo: Arc<dyn ProgressRepository>) -> Self {
        Self { catalog, repo }
    }

    /// Enroll a learner, creating their zeroed record.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentError::AlreadyEnrolled` if a record exists, or
    /// passes storage failures through unchanged.
    pub async fn enroll(&self, learner: LearnerId) -> Result<LearnerProgressRecord, EnrollmentError> {
        let record = LearnerProgressRecord::fresh(&self.catalog);
        match self.repo.create_record(learner, &record).await {
            Ok(()) => Ok(record),
            Err(StorageError::Conflict) => Err(EnrollmentError::AlreadyEnrolled(learner)),
            Err(err) => Err(EnrollmentError::Storage(err)),
        }
    }

    /// Whether the learner already has a record.
    ///
    /// # Errors
    ///
    /// Passes storage failures through unchanged.
    pub async fn is_enrolled(&self, learner: LearnerId) -> Result<bool, EnrollmentError> {
        match self.repo.load_record(learner).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound) => Ok(false),
            Err(err) => Err(EnrollmentError::Storage(err)),
        }
    }
}
