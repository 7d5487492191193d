use std::{error::Error, path::PathBuf, sync::Arc, time::Duration};

use machina_utils::MachinaUtilsError;
use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a machina-related operation.
pub type MachinaResult<T> = Result<T, MachinaError>;

/// An error that occurred while running an action.
///
/// The error is cloneable so that the runner can record it in the environment for the recovery
/// pass and still hand it back to the caller.
#[derive(pretty_error_debug::Debug, Error, Clone)]
pub enum MachinaError {
    /// A builder marker did not match any step.
    #[error("step not found: {0}")]
    StepNotFound(String),

    /// Another action already holds the lock.
    #[error("another action is already running against {0}")]
    LockContended(PathBuf),

    /// A collaborator the step needs is not in the environment.
    #[error("environment has no {0}")]
    MissingEnvironment(&'static str),

    /// The machine must be created first.
    #[error("machine '{0}' has not been created")]
    MachineNotCreated(String),

    /// The machine must be running first.
    #[error("machine '{0}' is not running")]
    MachineNotRunning(String),

    /// The machine left the allowed states while booting.
    #[error("machine entered state '{invalid}' while booting, valid states are: {valid}")]
    BootBadState {
        /// The allowed states, comma separated
        valid: String,

        /// The last observed state
        invalid: String,
    },

    /// The machine did not become ready in time.
    #[error("timed out after {0:?} waiting for the machine to boot")]
    BootTimeout(Duration),

    /// The action was interrupted by the user.
    #[error("action was interrupted")]
    Interrupted,

    /// The box is already in the box collection.
    #[error("box already exists: {0}")]
    BoxAlreadyExists(String),

    /// A guest capability was requested that the guest does not have.
    #[error("guest capability not found: {0}")]
    CapabilityNotFound(String),

    /// A provisioner is ordered relative to a provisioner that does not exist.
    #[error("provisioner '{name}' is ordered against unknown provisioner '{reference}'")]
    UnknownProvisionerReference {
        /// The provisioner with the constraint
        name: String,

        /// The name it refers to
        reference: String,
    },

    /// A synced folder asked for a type no plugin provides.
    #[error("unknown synced folder type: {0}")]
    UnknownSyncedFolderType(String),

    /// No synced folder plugin is usable for the machine.
    #[error("no usable synced folder implementation, available types: {0}")]
    NoDefaultSyncedFolderImpl(String),

    /// A synced folder host directory could not be created.
    #[error("failed to create synced folder host directory: {0}")]
    SyncedFolderCreateFailed(PathBuf),

    /// The UI cannot ask questions.
    #[error("ui is not interactive")]
    NonInteractive,

    /// An error raised by a provider, guest or other collaborator.
    #[error("{context}: {source}")]
    Collaborator {
        /// What was being done
        context: String,

        /// The underlying error
        source: Arc<dyn Error + Send + Sync>,
    },

    /// An I/O error.
    #[error("io error: {0}")]
    IoError(Arc<std::io::Error>),

    /// A JSON error.
    #[error("json error: {0}")]
    JsonError(Arc<serde_json::Error>),

    /// Custom error.
    #[error("custom error: {0}")]
    Custom(String),
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MachinaError {
    /// Wraps a collaborator error with some context.
    pub fn collaborator(
        context: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self::Collaborator {
            context: context.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a custom error.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl From<std::io::Error> for MachinaError {
    fn from(error: std::io::Error) -> Self {
        Self::IoError(Arc::new(error))
    }
}

impl From<serde_json::Error> for MachinaError {
    fn from(error: serde_json::Error) -> Self {
        Self::JsonError(Arc::new(error))
    }
}

impl From<MachinaUtilsError> for MachinaError {
    fn from(error: MachinaUtilsError) -> Self {
        match error {
            MachinaUtilsError::IoError(e) => e.into(),
            MachinaUtilsError::LockContended(path) => Self::LockContended(path),
        }
    }
}

impl From<tokio::task::JoinError> for MachinaError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::collaborator("background task failed", error)
    }
}
