use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── MODULE IDS ────────────────────────────────────────────────────────────────
//

/// Closed set of course modules, in canonical order.
///
/// The original data model keyed progress by raw slug strings; keeping the
/// set closed means an unknown module cannot reach the engine at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModuleId {
    Introducao,
    Decomposicao,
    RecPadrao,
    Abstracao,
    Algoritmo,
    ProjetoFinal,
}

impl ModuleId {
    /// All modules in canonical course order.
    pub const ALL: [ModuleId; 6] = [
        ModuleId::Introducao,
        ModuleId::Decomposicao,
        ModuleId::RecPadrao,
        ModuleId::Abstracao,
        ModuleId::Algoritmo,
        ModuleId::ProjetoFinal,
    ];

    /// Stable slug, used in routes and storage keys.
    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            ModuleId::Introducao => "introducao",
            ModuleId::Decomposicao => "decomposicao",
            ModuleId::RecPadrao => "rec-padrao",
            ModuleId::Abstracao => "abstracao",
            ModuleId::Algoritmo => "algoritmo",
            ModuleId::ProjetoFinal => "projeto-final",
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Error type for parsing a `ModuleId` from a slug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown module slug: {slug}")]
pub struct ParseModuleIdError {
    pub slug: String,
}

impl FromStr for ModuleId {
    type Err = ParseModuleIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModuleId::ALL
            .into_iter()
            .find(|id| id.slug() == s)
            .ok_or_else(|| ParseModuleIdError { slug: s.to_owned() })
    }
}

impl TryFrom<String> for ModuleId {
    type Error = ParseModuleIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModuleId> for String {
    fn from(id: ModuleId) -> Self {
        id.slug().to_owned()
    }
}

//
// ─── DESCRIPTORS ───────────────────────────────────────────────────────────────
//

/// Immutable definition of one course module.
///
/// Part of the static catalog; read-only at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    id: ModuleId,
    title: String,
    order: u32,
    lesson_count: u32,
    exercise_count: u32,
    completion_threshold: u32,
    dependency: Option<ModuleId>,
}

impl ModuleDescriptor {
    /// Creates a descriptor. Chain-level invariants are checked by `Catalog::new`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::EmptyTitle` if the title is blank, or
    /// `CatalogError::ThresholdExceedsExercises` if the completion threshold
    /// could never be reached.
    pub fn new(
        id: ModuleId,
        title: impl Into<String>,
        order: u32,
        lesson_count: u32,
        exercise_count: u32,
        completion_threshold: u32,
        dependency: Option<ModuleId>,
    ) -> Result<Self, CatalogError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CatalogError::EmptyTitle { module: id });
        }
        if completion_threshold > exercise_count {
            return Err(CatalogError::ThresholdExceedsExercises {
                module: id,
                threshold: completion_threshold,
                exercises: exercise_count,
            });
        }

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            order,
            lesson_count,
            exercise_count,
            completion_threshold,
            dependency,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// 1-based position in the course sequence.
    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn lesson_count(&self) -> u32 {
        self.lesson_count
    }

    #[must_use]
    pub fn exercise_count(&self) -> u32 {
        self.exercise_count
    }

    /// Minimum correct answers before the module counts as complete.
    ///
    /// Zero means the module is ungraded and is completed by explicit
    /// learner action instead.
    #[must_use]
    pub fn completion_threshold(&self) -> u32 {
        self.completion_threshold
    }

    /// Module that must be complete before this one unlocks.
    #[must_use]
    pub fn dependency(&self) -> Option<ModuleId> {
        self.dependency
    }

    /// True when the module accumulates graded exercise answers.
    #[must_use]
    pub fn is_graded(&self) -> bool {
        self.exercise_count > 0
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog cannot be empty")]
    Empty,

    #[error("module {module} has an empty title")]
    EmptyTitle { module: ModuleId },

    #[error("module {module} appears more than once")]
    DuplicateModule { module: ModuleId },

    #[error("module {module} is missing from the catalog")]
    MissingModule { module: ModuleId },

    #[error("module {module} has order {order}, expected {expected}")]
    OrderGap {
        module: ModuleId,
        order: u32,
        expected: u32,
    },

    #[error("first module {module} must not declare a dependency")]
    FirstModuleHasDependency { module: ModuleId },

    #[error("module {module} must depend on {expected}, found {found:?}")]
    BrokenChain {
        module: ModuleId,
        expected: ModuleId,
        found: Option<ModuleId>,
    },

    #[error(
        "module {module} requires {threshold} correct answers but only has {exercises} exercises"
    )]
    ThresholdExceedsExercises {
        module: ModuleId,
        threshold: u32,
        exercises: u32,
    },
}

/// The static, ordered definition of the course.
///
/// An injected immutable value rather than a process-wide global, so tests
/// and future course variants can carry their own. Validated on
/// construction: every `ModuleId` present exactly once, orders `1..=n`
/// ascending, and dependencies forming the single linear chain that matches
/// the order. Unlock derivation relies on that chain shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    modules: Vec<ModuleDescriptor>,
}

impl Catalog {
    /// Builds a catalog after validating the linear-chain invariants.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` describing the first violated invariant.
    pub fn new(mut modules: Vec<ModuleDescriptor>) -> Result<Self, CatalogError> {
        if modules.is_empty() {
            return Err(CatalogError::Empty);
        }

        modules.sort_by_key(ModuleDescriptor::order);

        for (index, descriptor) in modules.iter().enumerate() {
            let expected_order = u32::try_from(index + 1).unwrap_or(u32::MAX);
            if descriptor.order() != expected_order {
                return Err(CatalogError::OrderGap {
                    module: descriptor.id(),
                    order: descriptor.order(),
                    expected: expected_order,
                });
            }

            if modules[..index].iter().any(|m| m.id() == descriptor.id()) {
                return Err(CatalogError::DuplicateModule {
                    module: descriptor.id(),
                });
            }

            match (index, descriptor.dependency()) {
                (0, None) => {}
                (0, Some(_)) => {
                    return Err(CatalogError::FirstModuleHasDependency {
                        module: descriptor.id(),
                    });
                }
                (_, found) => {
                    let expected = modules[index - 1].id();
                    if found != Some(expected) {
                        return Err(CatalogError::BrokenChain {
                            module: descriptor.id(),
                            expected,
                            found,
                        });
                    }
                }
            }
        }

        for id in ModuleId::ALL {
            if !modules.iter().any(|m| m.id() == id) {
                return Err(CatalogError::MissingModule { module: id });
            }
        }

        Ok(Self { modules })
    }

    /// The shipped six-module computational-thinking course.
    ///
    /// # Panics
    ///
    /// Panics only if the built-in definition violates its own invariants,
    /// which the catalog tests pin down.
    #[must_use]
    pub fn course_default() -> Self {
        let modules = vec![
            ModuleDescriptor::new(
                ModuleId::Introducao,
                "Introdução ao Pensamento Computacional",
                1,
                4,
                5,
                3,
                None,
            ),
            ModuleDescriptor::new(
                ModuleId::Decomposicao,
                "Decomposição",
                2,
                5,
                5,
                3,
                Some(ModuleId::Introducao),
            ),
            ModuleDescriptor::new(
                ModuleId::RecPadrao,
                "Reconhecimento de Padrões",
                3,
                4,
                4,
                3,
                Some(ModuleId::Decomposicao),
            ),
            ModuleDescriptor::new(
                ModuleId::Abstracao,
                "Abstração",
                4,
                4,
                4,
                3,
                Some(ModuleId::RecPadrao),
            ),
            ModuleDescriptor::new(
                ModuleId::Algoritmo,
                "Algoritmos",
                5,
                6,
                5,
                3,
                Some(ModuleId::Abstracao),
            ),
            ModuleDescriptor::new(
                ModuleId::ProjetoFinal,
                "Projeto Final",
                6,
                1,
                0,
                0,
                Some(ModuleId::Algoritmo),
            ),
        ]
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .expect("built-in module definitions should be valid");

        Self::new(modules).expect("built-in course should satisfy catalog invariants")
    }

    /// Ordered module descriptors, never empty.
    #[must_use]
    pub fn modules(&self) -> &[ModuleDescriptor] {
        &self.modules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Descriptor for a module. Total for any validated catalog.
    ///
    /// # Panics
    ///
    /// Panics if the catalog was somehow built without the module, which
    /// `Catalog::new` rules out.
    #[must_use]
    pub fn descriptor(&self, id: ModuleId) -> &ModuleDescriptor {
        self.modules
            .iter()
            .find(|m| m.id() == id)
            .expect("validated catalog contains every ModuleId")
    }

    /// Lookup by raw slug, for callers holding route strings.
    #[must_use]
    pub fn find_by_slug(&self, slug: &str) -> Option<&ModuleDescriptor> {
        let id = slug.parse::<ModuleId>().ok()?;
        Some(self.descriptor(id))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
