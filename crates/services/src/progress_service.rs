use std::sync::Arc;

use pcteacher_core::engine::{
    CourseOverview, FinalizeOutcome, ModuleView, ProgressEngine, SubmissionOutcome,
};
use pcteacher_core::grading::{GradeOutcome, Grader};
use pcteacher_core::model::{Catalog, LearnerId};
use pcteacher_core::time::Clock;
use storage::repository::ProgressRepository;

use crate::error::ProgressError;

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Drives the progress engine against persisted learner records.
///
/// Every operation loads a fresh copy of the record, lets the engine
/// validate and compute, and persists mutations through the repository's
/// atomic primitives. The engine result is an optimistic projection; the
/// store's post-increment row wins on counters, so concurrent submissions
/// for the same learner and module both count instead of clobbering each
/// other. No retries here: storage failures pass through unchanged and the
/// caller reloads at the storage layer rather than replaying the engine
/// operation.
#[derive(Clone)]
pub struct ProgressService {
    engine: ProgressEngine,
    repo: Arc<dyn ProgressRepository>,
    grader: Arc<dyn Grader + Send + Sync>,
    clock: Clock,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        catalog: Catalog,
        repo: Arc<dyn ProgressRepository>,
        grader: Arc<dyn Grader + Send + Sync>,
    ) -> Self {
        Self {
            engine: ProgressEngine::new(catalog),
            repo,
            grader,
            clock: Clock::default(),
        }
    }

    /// Replace the clock, mainly to fix time in tests.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn engine(&self) -> &ProgressEngine {
        &self.engine
    }

    /// Full course aggregate for the learner, recomputed from the record.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` when the record cannot be loaded.
    pub async fn overview(&self, learner: LearnerId) -> Result<CourseOverview, ProgressError> {
        let record = self.repo.load_record(learner).await?;
        Ok(self.engine.course_overview(&record))
    }

    /// View of one module, resolved from a raw route slug.
    ///
    /// The web layer gates content routes on `is_unlocked` here instead of
    /// trusting its own navigation state.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ModuleNotFound` for unknown slugs, or storage
    /// failures unchanged.
    pub async fn module_view(
        &self,
        learner: LearnerId,
        slug: &str,
    ) -> Result<ModuleView, ProgressError> {
        let id = self.engine.resolve_slug(slug)?;
        let record = self.repo.load_record(learner).await?;
        Ok(self.engine.module_view(&record, id))
    }

    /// Grade and record one exercise submission.
    ///
    /// The engine validates against the freshly loaded record (unknown
    /// slug, locked module, ungraded module, empty answer) and produces the
    /// per-request feedback; the actual counter movement goes through the
    /// store's conditional increment, and the completion flip through its
    /// one-way update. The returned outcome carries the store's
    /// authoritative counters.
    ///
    /// # Errors
    ///
    /// Engine precondition failures and storage failures, both unchanged.
    pub async fn submit_exercise(
        &self,
        learner: LearnerId,
        slug: &str,
        answer: &str,
    ) -> Result<SubmissionOutcome, ProgressError> {
        let id = self.engine.resolve_slug(slug)?;
        let mut record = self.repo.load_record(learner).await?;

        let projected = self.engine.submit_exercise(
            &mut record,
            id,
            answer,
            self.grader.as_ref(),
            self.clock.now(),
        )?;
        if projected.already_completed {
            return Ok(projected);
        }

        let outcome = if projected.is_correct {
            GradeOutcome::Correct
        } else {
            GradeOutcome::Incorrect
        };
        let mut stored = self.repo.increment_answer(learner, id, outcome).await?;

        let threshold = self.engine.catalog().descriptor(id).completion_threshold();
        if !stored.is_completed() && stored.correct_count() >= threshold {
            stored = self
                .repo
                .complete_module(learner, id, self.clock.now())
                .await?;
        }

        Ok(SubmissionOutcome {
            module: id,
            is_correct: projected.is_correct,
            correct_count: stored.correct_count(),
            incorrect_count: stored.incorrect_count(),
            already_completed: false,
            is_now_completed: stored.is_completed(),
            remaining_to_complete: threshold.saturating_sub(stored.correct_count()),
        })
    }

    /// Explicitly mark a module complete (the "conclude module" action).
    ///
    /// # Errors
    ///
    /// `EngineError::DependencyNotMet` while the predecessor is incomplete;
    /// storage failures unchanged.
    pub async fn finalize_module(
        &self,
        learner: LearnerId,
        slug: &str,
    ) -> Result<FinalizeOutcome, ProgressError> {
        let id = self.engine.resolve_slug(slug)?;
        let mut record = self.repo.load_record(learner).await?;

        let projected = self
            .engine
            .finalize_module(&mut record, id, self.clock.now())?;
        if projected.already_completed {
            return Ok(projected);
        }

        let stored = self
            .repo
            .complete_module(learner, id, self.clock.now())
            .await?;
        Ok(FinalizeOutcome {
            module: id,
            already_completed: false,
            completed_at: stored.completed_at(),
        })
    }

    /// Convenience around `module_view` for route-level gating.
    ///
    /// # Errors
    ///
    /// Same as `module_view`.
    pub async fn is_unlocked(
        &self,
        learner: LearnerId,
        slug: &str,
    ) -> Result<bool, ProgressError> {
        Ok(self.module_view(learner, slug).await?.is_unlocked)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
