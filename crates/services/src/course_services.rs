use std::sync::Arc;

use pcteacher_core::grading::Grader;
use pcteacher_core::model::Catalog;
use pcteacher_core::time::Clock;
use storage::repository::Storage;

use crate::certificate_service::CertificateService;
use crate::enrollment_service::EnrollmentService;
use crate::error::CourseServicesError;
use crate::keyword_grader::KeywordGrader;
use crate::progress_service::ProgressService;

/// Assembles the course-facing services over one storage backend.
#[derive(Clone)]
pub struct CourseServices {
    enrollment: Arc<EnrollmentService>,
    progress: Arc<ProgressService>,
    certificates: Arc<CertificateService>,
}

impl CourseServices {
    /// Build services over an already-initialized storage backend.
    #[must_use]
    pub fn new(
        catalog: Catalog,
        storage: &Storage,
        grader: Arc<dyn Grader + Send + Sync>,
        clock: Clock,
    ) -> Self {
        let enrollment = Arc::new(EnrollmentService::new(
            catalog.clone(),
            Arc::clone(&storage.progress),
        ));
        let progress = Arc::new(
            ProgressService::new(catalog.clone(), Arc::clone(&storage.progress), grader)
                .with_clock(clock),
        );
        let certificates = Arc::new(
            CertificateService::new(catalog, Arc::clone(&storage.progress)).with_clock(clock),
        );

        Self {
            enrollment,
            progress,
            certificates,
        }
    }

    /// Build services backed by `SQLite` storage, with the shipped course
    /// catalog and the stand-in keyword grader.
    ///
    /// # Errors
    ///
    /// Returns `CourseServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, CourseServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(
            Catalog::course_default(),
            &storage,
            Arc::new(KeywordGrader::course_default()),
            clock,
        ))
    }

    /// In-memory services for tests and prototyping.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(
            Catalog::course_default(),
            &Storage::in_memory(),
            Arc::new(KeywordGrader::course_default()),
            clock,
        )
    }

    #[must_use]
    pub fn enrollment(&self) -> &EnrollmentService {
        &self.enrollment
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressService {
        &self.progress
    }

    #[must_use]
    pub fn certificates(&self) -> &CertificateService {
        &self.certificates
    }
}
