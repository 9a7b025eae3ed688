use dentata_path::{Path, PathError};
use thiserror::Error;

/// Errors returned by store and cursor operations.
///
/// Every variant is a contract violation by the caller; none is transient.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("the root value cannot be absent")]
    AbsentRoot,
    #[error("no value at '{path}'")]
    Absent { path: Path },
    #[error("value at '{path}' is not an object or array")]
    NotTraversable { path: Path },
    #[error("key '{key}' cannot address the value at '{path}'")]
    InvalidKey { key: String, path: Path },
    #[error("cursor at '{path}' was deleted or released")]
    Detached { path: Path },
    #[error(transparent)]
    Path(#[from] PathError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
