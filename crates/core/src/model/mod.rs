mod catalog;
mod ids;
mod progress;

pub use catalog::{Catalog, CatalogError, ModuleDescriptor, ModuleId, ParseModuleIdError};
pub use ids::{LearnerId, ParseLearnerIdError};
pub use progress::{LearnerProgressRecord, ModuleProgress, ProgressDataError};
