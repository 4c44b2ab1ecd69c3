use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::grading::GradeOutcome;
use crate::model::catalog::{Catalog, ModuleId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressDataError {
    #[error("module {module} has a completion timestamp but is not completed")]
    TimestampWithoutCompletion { module: ModuleId },

    #[error("record is missing progress for module {module}")]
    MissingModule { module: ModuleId },
}

//
// ─── MODULE PROGRESS ───────────────────────────────────────────────────────────
//

/// Mutable per-module score for one learner.
///
/// Counters only grow while the module is active, and freeze once
/// `completed` flips; completion is one-way. Mutation goes through
/// `record_answer` and `mark_completed` so those invariants cannot be
/// bypassed. Serializable for export; rehydration goes through
/// `from_persisted` so inconsistent rows cannot sneak back in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleProgress {
    correct_count: u32,
    incorrect_count: u32,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
}

impl ModuleProgress {
    /// Rehydrate module progress from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressDataError::TimestampWithoutCompletion` if the row
    /// carries a completion timestamp without the completed flag.
    pub fn from_persisted(
        module: ModuleId,
        correct_count: u32,
        incorrect_count: u32,
        completed: bool,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ProgressDataError> {
        if completed_at.is_some() && !completed {
            return Err(ProgressDataError::TimestampWithoutCompletion { module });
        }

        Ok(Self {
            correct_count,
            incorrect_count,
            completed,
            completed_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn incorrect_count(&self) -> u32 {
        self.incorrect_count
    }

    /// Total graded submissions so far.
    #[must_use]
    pub fn exercises_done(&self) -> u32 {
        self.correct_count + self.incorrect_count
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Count one graded answer. No-op on a completed module.
    ///
    /// Returns true when a counter actually moved.
    pub fn record_answer(&mut self, outcome: GradeOutcome) -> bool {
        if self.completed {
            return false;
        }
        match outcome {
            GradeOutcome::Correct => {
                self.correct_count = self.correct_count.saturating_add(1);
            }
            GradeOutcome::Incorrect => {
                self.incorrect_count = self.incorrect_count.saturating_add(1);
            }
        }
        true
    }

    /// One-way completion; keeps the first timestamp on repeat calls.
    pub fn mark_completed(&mut self, at: DateTime<Utc>) {
        if self.completed {
            return;
        }
        self.completed = true;
        self.completed_at = Some(at);
    }
}

//
// ─── LEARNER RECORD ────────────────────────────────────────────────────────────
//

/// Full per-learner state across all course modules.
///
/// Created once at enrollment with every module zeroed, read on every
/// progress view, and mutated only by exercise submission and explicit
/// module finalization. Never deleted by the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LearnerProgressRecord {
    modules: BTreeMap<ModuleId, ModuleProgress>,
}

impl LearnerProgressRecord {
    /// Zeroed record covering every module of the catalog.
    #[must_use]
    pub fn fresh(catalog: &Catalog) -> Self {
        let modules = catalog
            .modules()
            .iter()
            .map(|descriptor| (descriptor.id(), ModuleProgress::default()))
            .collect();
        Self { modules }
    }

    /// Rebuild a record from persisted per-module rows.
    ///
    /// # Errors
    ///
    /// Returns `ProgressDataError::MissingModule` if any catalog module has
    /// no row.
    pub fn from_persisted(
        catalog: &Catalog,
        modules: BTreeMap<ModuleId, ModuleProgress>,
    ) -> Result<Self, ProgressDataError> {
        for descriptor in catalog.modules() {
            if !modules.contains_key(&descriptor.id()) {
                return Err(ProgressDataError::MissingModule {
                    module: descriptor.id(),
                });
            }
        }
        Ok(Self { modules })
    }

    /// Progress for one module; zeroed default for modules the record
    /// predates.
    #[must_use]
    pub fn module(&self, id: ModuleId) -> ModuleProgress {
        self.modules.get(&id).cloned().unwrap_or_default()
    }

    pub(crate) fn module_mut(&mut self, id: ModuleId) -> &mut ModuleProgress {
        self.modules.entry(id).or_default()
    }

    /// Replace one module's progress with an authoritative row from storage.
    pub fn apply_module(&mut self, id: ModuleId, progress: ModuleProgress) {
        self.modules.insert(id, progress);
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, &ModuleProgress)> {
        self.modules.iter().map(|(id, progress)| (*id, progress))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn fresh_record_covers_every_module_zeroed() {
        let catalog = Catalog::course_default();
        let record = LearnerProgressRecord::fresh(&catalog);

        for descriptor in catalog.modules() {
            let progress = record.module(descriptor.id());
            assert_eq!(progress.correct_count(), 0);
            assert_eq!(progress.incorrect_count(), 0);
            assert!(!progress.is_completed());
            assert_eq!(progress.completed_at(), None);
        }
    }

    #[test]
    fn record_answer_moves_exactly_one_counter() {
        let mut progress = ModuleProgress::default();

        assert!(progress.record_answer(GradeOutcome::Correct));
        assert_eq!(progress.correct_count(), 1);
        assert_eq!(progress.incorrect_count(), 0);

        assert!(progress.record_answer(GradeOutcome::Incorrect));
        assert_eq!(progress.correct_count(), 1);
        assert_eq!(progress.incorrect_count(), 1);
        assert_eq!(progress.exercises_done(), 2);
    }

    #[test]
    fn counters_freeze_after_completion() {
        let mut progress = ModuleProgress::default();
        progress.record_answer(GradeOutcome::Correct);
        progress.mark_completed(fixed_now());

        assert!(!progress.record_answer(GradeOutcome::Correct));
        assert!(!progress.record_answer(GradeOutcome::Incorrect));
        assert_eq!(progress.correct_count(), 1);
        assert_eq!(progress.incorrect_count(), 0);
    }

    #[test]
    fn completion_keeps_first_timestamp() {
        let mut progress = ModuleProgress::default();
        let first = fixed_now();
        progress.mark_completed(first);
        progress.mark_completed(first + chrono::Duration::days(3));

        assert!(progress.is_completed());
        assert_eq!(progress.completed_at(), Some(first));
    }

    #[test]
    fn from_persisted_rejects_orphan_timestamp() {
        let err = ModuleProgress::from_persisted(
            ModuleId::Abstracao,
            2,
            1,
            false,
            Some(fixed_now()),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ProgressDataError::TimestampWithoutCompletion {
                module: ModuleId::Abstracao
            }
        ));
    }

    #[test]
    fn record_from_persisted_requires_every_module() {
        let catalog = Catalog::course_default();
        let mut modules = BTreeMap::new();
        modules.insert(ModuleId::Introducao, ModuleProgress::default());

        let err = LearnerProgressRecord::from_persisted(&catalog, modules).unwrap_err();
        assert!(matches!(err, ProgressDataError::MissingModule { .. }));
    }

    #[test]
    fn record_serializes_modules_keyed_by_slug() {
        let catalog = Catalog::course_default();
        let mut record = LearnerProgressRecord::fresh(&catalog);
        record
            .module_mut(ModuleId::Introducao)
            .record_answer(GradeOutcome::Correct);

        let json = serde_json::to_value(&record).unwrap();
        let intro = &json["modules"]["introducao"];
        assert_eq!(intro["correct_count"], 1);
        assert_eq!(intro["completed"], false);
        assert!(json["modules"]["projeto-final"].is_object());
    }

    #[test]
    fn apply_module_overwrites_with_authoritative_row() {
        let catalog = Catalog::course_default();
        let mut record = LearnerProgressRecord::fresh(&catalog);

        let row =
            ModuleProgress::from_persisted(ModuleId::Introducao, 3, 1, true, Some(fixed_now()))
                .unwrap();
        record.apply_module(ModuleId::Introducao, row.clone());

        assert_eq!(record.module(ModuleId::Introducao), row);
    }
}
