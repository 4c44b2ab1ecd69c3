use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::grading::Grader;
use crate::model::{Catalog, LearnerProgressRecord, ModuleDescriptor, ModuleId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Precondition failures of engine operations.
///
/// These are the only ways an engine call can fail; each maps to a
/// user-facing, non-fatal message at the call site.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    #[error("unknown module: {slug}")]
    ModuleNotFound { slug: String },

    #[error("module {module} is locked; complete its predecessor first")]
    ModuleLocked { module: ModuleId },

    #[error("module {module} has no graded exercises")]
    ModuleNotGraded { module: ModuleId },

    #[error("module {module} requires {requires} to be completed first")]
    DependencyNotMet {
        module: ModuleId,
        requires: ModuleId,
    },

    #[error("answer cannot be empty")]
    InvalidAnswer,
}

//
// ─── DERIVED STATE ─────────────────────────────────────────────────────────────
//

/// Per-module state, derived from the record on every read, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleState {
    Locked,
    InProgress,
    Completed,
}

//
// ─── VIEWS ─────────────────────────────────────────────────────────────────────
//

/// Presentation-agnostic view of one module for a given learner.
///
/// No pre-formatted strings and no localization assumptions; the rendering
/// layer formats as it sees fit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleView {
    pub id: ModuleId,
    pub title: String,
    pub order: u32,
    pub state: ModuleState,
    pub is_unlocked: bool,
    pub is_completed: bool,
    pub lesson_count: u32,
    pub exercise_count: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub exercises_done: u32,
    pub min_required: u32,
    pub remaining_to_complete: u32,
}

/// Course-wide aggregate, recomputed on every read.
///
/// No denormalized percentage is trusted as source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseOverview {
    pub modules: Vec<ModuleView>,
    pub completed_modules: u32,
    pub total_modules: u32,
    pub overall_percent: u32,
    pub total_correct: u32,
    pub total_incorrect: u32,
}

impl CourseOverview {
    /// The certificate issuer's only eligibility gate.
    #[must_use]
    pub fn certificate_ready(&self) -> bool {
        self.overall_percent == 100
    }
}

/// Feedback for a single graded submission.
///
/// Counters reflect the record this call operated on; under concurrent
/// submissions the storage layer's post-increment row is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    pub module: ModuleId,
    pub is_correct: bool,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub already_completed: bool,
    pub is_now_completed: bool,
    pub remaining_to_complete: u32,
}

/// Result of an explicit module finalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalizeOutcome {
    pub module: ModuleId,
    pub already_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// The progress/unlock state machine over one learner's record.
///
/// Pure and synchronous: every operation is a deterministic transformation
/// of the caller-supplied record, and the engine holds no state between
/// calls beyond the immutable catalog. Callers load a fresh record, invoke
/// an operation, and persist the result themselves.
#[derive(Debug, Clone)]
pub struct ProgressEngine {
    catalog: Catalog,
}

impl ProgressEngine {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Resolve a raw slug, for service entry points holding route strings.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ModuleNotFound` for slugs outside the catalog.
    pub fn resolve_slug(&self, slug: &str) -> Result<ModuleId, EngineError> {
        self.catalog
            .find_by_slug(slug)
            .map(ModuleDescriptor::id)
            .ok_or_else(|| EngineError::ModuleNotFound {
                slug: slug.to_owned(),
            })
    }

    /// Whether the learner may interact with the module.
    ///
    /// The first module is always unlocked; any other module unlocks when
    /// its immediate predecessor is completed. Because the catalog is a
    /// validated linear chain and completion is monotonic, checking only
    /// the immediate predecessor is equivalent to "all predecessors
    /// complete". This shortcut is an assumption baked into the catalog
    /// shape, not a general dependency-graph evaluator.
    #[must_use]
    pub fn is_unlocked(&self, record: &LearnerProgressRecord, id: ModuleId) -> bool {
        match self.catalog.descriptor(id).dependency() {
            None => true,
            Some(dependency) => record.module(dependency).is_completed(),
        }
    }

    /// Derived state of one module: locked, in progress, or completed.
    #[must_use]
    pub fn module_state(&self, record: &LearnerProgressRecord, id: ModuleId) -> ModuleState {
        if record.module(id).is_completed() {
            ModuleState::Completed
        } else if self.is_unlocked(record, id) {
            ModuleState::InProgress
        } else {
            ModuleState::Locked
        }
    }

    /// View of one module for the given record.
    #[must_use]
    pub fn module_view(&self, record: &LearnerProgressRecord, id: ModuleId) -> ModuleView {
        let descriptor = self.catalog.descriptor(id);
        let progress = record.module(id);
        let state = self.module_state(record, id);

        ModuleView {
            id,
            title: descriptor.title().to_owned(),
            order: descriptor.order(),
            state,
            is_unlocked: state != ModuleState::Locked,
            is_completed: state == ModuleState::Completed,
            lesson_count: descriptor.lesson_count(),
            exercise_count: descriptor.exercise_count(),
            correct_count: progress.correct_count(),
            incorrect_count: progress.incorrect_count(),
            exercises_done: progress.exercises_done(),
            min_required: descriptor.completion_threshold(),
            remaining_to_complete: descriptor
                .completion_threshold()
                .saturating_sub(progress.correct_count()),
        }
    }

    /// Full course aggregate: ordered module views, completion percentage,
    /// and answer totals.
    #[must_use]
    pub fn course_overview(&self, record: &LearnerProgressRecord) -> CourseOverview {
        let modules: Vec<ModuleView> = self
            .catalog
            .modules()
            .iter()
            .map(|descriptor| self.module_view(record, descriptor.id()))
            .collect();

        let total_modules = u32::try_from(modules.len()).unwrap_or(u32::MAX);
        let completed_modules =
            u32::try_from(modules.iter().filter(|m| m.is_completed).count()).unwrap_or(u32::MAX);
        let total_correct = modules.iter().map(|m| m.correct_count).sum();
        let total_incorrect = modules.iter().map(|m| m.incorrect_count).sum();

        // floor(100 * completed / total); total is never zero for a valid catalog
        let overall_percent = if total_modules == 0 {
            0
        } else {
            completed_modules * 100 / total_modules
        };

        CourseOverview {
            modules,
            completed_modules,
            total_modules,
            overall_percent,
            total_correct,
            total_incorrect,
        }
    }

    /// Grade one exercise answer and fold it into the record.
    ///
    /// Mutates exactly one module's progress; a submission on an
    /// already-completed module is a no-op that echoes the current counters
    /// with `already_completed` set, so re-submission never double-counts.
    /// Crossing the completion threshold flips the module to completed,
    /// one-way, stamped with `now`.
    ///
    /// # Errors
    ///
    /// - `InvalidAnswer` for an empty or whitespace-only answer.
    /// - `ModuleNotGraded` if the module has no exercises.
    /// - `ModuleLocked` if the dependency chain has not reached the module,
    ///   even when a caller bypassed UI-level gating.
    pub fn submit_exercise(
        &self,
        record: &mut LearnerProgressRecord,
        id: ModuleId,
        answer: &str,
        grader: &dyn Grader,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome, EngineError> {
        if answer.trim().is_empty() {
            return Err(EngineError::InvalidAnswer);
        }

        let descriptor = self.catalog.descriptor(id);
        if !descriptor.is_graded() {
            return Err(EngineError::ModuleNotGraded { module: id });
        }
        if !self.is_unlocked(record, id) {
            return Err(EngineError::ModuleLocked { module: id });
        }

        let threshold = descriptor.completion_threshold();
        let progress = record.module_mut(id);

        if progress.is_completed() {
            return Ok(SubmissionOutcome {
                module: id,
                is_correct: false,
                correct_count: progress.correct_count(),
                incorrect_count: progress.incorrect_count(),
                already_completed: true,
                is_now_completed: false,
                remaining_to_complete: 0,
            });
        }

        let outcome = grader.grade(id, answer);
        progress.record_answer(outcome);

        // outcome-independent so a zero-threshold graded module still
        // completes on its first submission
        let is_now_completed = progress.correct_count() >= threshold;
        if is_now_completed {
            progress.mark_completed(now);
        }

        Ok(SubmissionOutcome {
            module: id,
            is_correct: outcome.is_correct(),
            correct_count: progress.correct_count(),
            incorrect_count: progress.incorrect_count(),
            already_completed: false,
            is_now_completed,
            remaining_to_complete: threshold.saturating_sub(progress.correct_count()),
        })
    }

    /// Explicit learner action marking a module complete.
    ///
    /// This is how ungraded modules (the capstone) finish; it also covers
    /// the original platform's direct "conclude module" action on any
    /// unlocked module. Idempotent: finalizing a completed module reports
    /// `already_completed` and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::DependencyNotMet` while the predecessor is
    /// incomplete.
    pub fn finalize_module(
        &self,
        record: &mut LearnerProgressRecord,
        id: ModuleId,
        now: DateTime<Utc>,
    ) -> Result<FinalizeOutcome, EngineError> {
        let descriptor = self.catalog.descriptor(id);
        if let Some(requires) = descriptor.dependency() {
            if !record.module(requires).is_completed() {
                return Err(EngineError::DependencyNotMet {
                    module: id,
                    requires,
                });
            }
        }

        let progress = record.module_mut(id);
        if progress.is_completed() {
            return Ok(FinalizeOutcome {
                module: id,
                already_completed: true,
                completed_at: progress.completed_at(),
            });
        }

        progress.mark_completed(now);
        Ok(FinalizeOutcome {
            module: id,
            already_completed: false,
            completed_at: progress.completed_at(),
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
