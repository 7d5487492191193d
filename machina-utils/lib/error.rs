use std::path::PathBuf;

use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a machina-utils related operation.
pub type MachinaUtilsResult<T> = Result<T, MachinaUtilsError>;

/// An error that occurred during a machina-utils operation.
#[derive(pretty_error_debug::Debug, Error)]
pub enum MachinaUtilsError {
    /// An I/O error.
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    /// The lock file is already held by someone else.
    #[error("lock is already held: {0}")]
    LockContended(PathBuf),
}
