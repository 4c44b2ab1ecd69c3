use serde::{Deserialize, Serialize};

use crate::model::ModuleId;

/// Result of grading one submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeOutcome {
    Correct,
    Incorrect,
}

impl GradeOutcome {
    #[must_use]
    pub fn is_correct(self) -> bool {
        matches!(self, GradeOutcome::Correct)
    }
}

/// Pluggable grading policy.
///
/// The engine never decides whether an answer is right; it only counts the
/// verdict. Implementations range from the stand-in keyword matcher in the
/// services crate to whatever a real grader would be.
pub trait Grader {
    fn grade(&self, module: ModuleId, answer: &str) -> GradeOutcome;
}

/// Closure adapter, mainly for tests.
pub struct FnGrader<F>(pub F);

impl<F> Grader for FnGrader<F>
where
    F: Fn(ModuleId, &str) -> GradeOutcome,
{
    fn grade(&self, module: ModuleId, answer: &str) -> GradeOutcome {
        (self.0)(module, answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fn_grader_delegates_to_closure() {
        let grader = FnGrader(|module, answer: &str| {
            if module == ModuleId::Introducao && answer == "42" {
                GradeOutcome::Correct
            } else {
                GradeOutcome::Incorrect
            }
        });

        assert!(grader.grade(ModuleId::Introducao, "42").is_correct());
        assert!(!grader.grade(ModuleId::Decomposicao, "42").is_correct());
    }
}
