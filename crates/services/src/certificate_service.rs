use std::sync::Arc;

use chrono::{DateTime, Utc};

use pcteacher_core::engine::ProgressEngine;
use pcteacher_core::model::{Catalog, LearnerId};
use pcteacher_core::time::Clock;
use storage::repository::ProgressRepository;

use crate::error::CertificateError;

/// Eligibility snapshot the certificate issuer reads.
///
/// The issuer needs nothing beyond the 100% gate; the rest is context for
/// the progress page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateEligibility {
    pub learner: LearnerId,
    pub eligible: bool,
    pub overall_percent: u32,
    pub completed_modules: u32,
    pub total_modules: u32,
}

/// Proof that the gate was passed, handed to the document renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCertificate {
    pub learner: LearnerId,
    pub issued_at: DateTime<Utc>,
    pub completed_modules: u32,
}

/// Gates certificate issuance on full course completion.
///
/// Document rendering itself lives outside this crate; this service only
/// answers "may this learner have one".
#[derive(Clone)]
pub struct CertificateService {
    engine: ProgressEngine,
    repo: Arc<dyn ProgressRepository>,
    clock: Clock,
}

impl CertificateService {
    #[must_use]
    pub fn new(catalog: Catalog, repo: Arc<dyn ProgressRepository>) -> Self {
        Self {
            engine: ProgressEngine::new(catalog),
            repo,
            clock: Clock::default(),
        }
    }

    /// Replace the clock, mainly to fix time in tests.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current eligibility, derived from the live record.
    ///
    /// # Errors
    ///
    /// Passes storage failures through unchanged.
    pub async fn eligibility(
        &self,
        learner: LearnerId,
    ) -> Result<CertificateEligibility, CertificateError> {
        let record = self.repo.load_record(learner).await?;
        let overview = self.engine.course_overview(&record);

        Ok(CertificateEligibility {
            learner,
            eligible: overview.certificate_ready(),
            overall_percent: overview.overall_percent,
            completed_modules: overview.completed_modules,
            total_modules: overview.total_modules,
        })
    }

    /// Issue a certificate token for a fully completed course.
    ///
    /// # Errors
    ///
    /// Returns `CertificateError::NotEligible` below 100% completion.
    pub async fn issue(&self, learner: LearnerId) -> Result<IssuedCertificate, CertificateError> {
        let eligibility = self.eligibility(learner).await?;
        if !eligibility.eligible {
            return Err(CertificateError::NotEligible {
                percent: eligibility.overall_percent,
            });
        }

        Ok(IssuedCertificate {
            learner,
            issued_at: self.clock.now(),
            completed_modules: eligibility.completed_modules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcteacher_core::model::{LearnerProgressRecord, ModuleId};
    use pcteacher_core::time::{fixed_clock, fixed_now};
    use storage::repository::{InMemoryRepository, ProgressRepository};

    async fn setup(completed: &[ModuleId]) -> CertificateService {
        let repo = Arc::new(InMemoryRepository::new());
        let catalog = Catalog::course_default();
        let learner = LearnerId::new(1);

        repo.create_record(learner, &LearnerProgressRecord::fresh(&catalog))
            .await
            .unwrap();
        for module in completed {
            repo.complete_module(learner, *module, fixed_now())
                .await
                .unwrap();
        }

        CertificateService::new(catalog, repo).with_clock(fixed_clock())
    }

    #[tokio::test]
    async fn partial_completion_is_not_eligible() {
        let service = setup(&[
            ModuleId::Introducao,
            ModuleId::Decomposicao,
            ModuleId::RecPadrao,
        ])
        .await;

        let eligibility = service.eligibility(LearnerId::new(1)).await.unwrap();
        assert!(!eligibility.eligible);
        assert_eq!(eligibility.overall_percent, 50);

        let err = service.issue(LearnerId::new(1)).await.unwrap_err();
        assert!(matches!(err, CertificateError::NotEligible { percent: 50 }));
    }

    #[tokio::test]
    async fn full_completion_including_capstone_is_eligible() {
        let service = setup(&ModuleId::ALL).await;

        let eligibility = service.eligibility(LearnerId::new(1)).await.unwrap();
        assert!(eligibility.eligible);
        assert_eq!(eligibility.overall_percent, 100);

        let issued = service.issue(LearnerId::new(1)).await.unwrap();
        assert_eq!(issued.issued_at, fixed_now());
        assert_eq!(issued.completed_modules, 6);
    }

    #[tokio::test]
    async fn five_of_six_is_still_gated() {
        let service = setup(&ModuleId::ALL[..5]).await;

        let eligibility = service.eligibility(LearnerId::new(1)).await.unwrap();
        assert!(!eligibility.eligible);
        assert_eq!(eligibility.overall_percent, 83);
    }
}
