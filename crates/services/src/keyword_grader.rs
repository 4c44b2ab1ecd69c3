use std::collections::HashMap;

use pcteacher_core::grading::{GradeOutcome, Grader};
use pcteacher_core::model::ModuleId;

/// Stand-in grading policy: case-insensitive keyword containment.
///
/// The reference platform graded exercises by looking for the module's key
/// terms in the free-text answer. This is explicitly not production-grade
/// grading; it exists so the engine has a concrete `Grader` to run against
/// until a real one is plugged in.
#[derive(Debug, Clone, Default)]
pub struct KeywordGrader {
    keywords: HashMap<ModuleId, Vec<String>>,
}

impl KeywordGrader {
    #[must_use]
    pub fn new(keywords: HashMap<ModuleId, Vec<String>>) -> Self {
        let keywords = keywords
            .into_iter()
            .map(|(module, words)| {
                let words = words
                    .into_iter()
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect();
                (module, words)
            })
            .collect();
        Self { keywords }
    }

    /// Keyword lists for the shipped course, one per graded module.
    #[must_use]
    pub fn course_default() -> Self {
        let mut keywords = HashMap::new();
        keywords.insert(
            ModuleId::Introducao,
            vec!["pensamento computacional", "problema", "computador"],
        );
        keywords.insert(
            ModuleId::Decomposicao,
            vec!["decomposicao", "decomposição", "dividir", "partes"],
        );
        keywords.insert(
            ModuleId::RecPadrao,
            vec!["padrão", "padrao", "repetição", "semelhança"],
        );
        keywords.insert(
            ModuleId::Abstracao,
            vec!["abstração", "abstracao", "essencial", "detalhes"],
        );
        keywords.insert(
            ModuleId::Algoritmo,
            vec!["algoritmo", "passo a passo", "sequência", "instruções"],
        );

        Self::new(
            keywords
                .into_iter()
                .map(|(module, words)| {
                    (module, words.into_iter().map(str::to_owned).collect())
                })
                .collect(),
        )
    }
}

impl Grader for KeywordGrader {
    fn grade(&self, module: ModuleId, answer: &str) -> GradeOutcome {
        let answer = answer.to_lowercase();
        let matched = self
            .keywords
            .get(&module)
            .is_some_and(|words| words.iter().any(|word| answer.contains(word)));

        if matched {
            GradeOutcome::Correct
        } else {
            GradeOutcome::Incorrect
        }
    }
}
