use thiserror::Error;

use crate::engine::EngineError;
use crate::model::{CatalogError, ProgressDataError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    ProgressData(#[from] ProgressDataError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}
