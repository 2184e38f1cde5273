use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::config::ConfigError;
use crate::core::io::cpptraj::CpptrajError;
use crate::core::io::pdb::RecordError;
use crate::core::io::table::TableError;
use crate::core::models::table::TableModelError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot open '{path}': {source}", path = path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Format error: {0}")]
    Record(#[from] RecordError),

    #[error("I/O error while reading '{path}': {source}", path = path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error while writing '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Cpptraj(#[from] CpptrajError),

    #[error("No run directories found under '{root}'", root = root.display())]
    NoRuns { root: PathBuf },
}

impl From<TableModelError> for EngineError {
    fn from(e: TableModelError) -> Self {
        EngineError::Config(ConfigError::Table(e))
    }
}
