//! Well-known path and file names used across machina.

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The directory name of the machina home under the user's home directory
pub const MACHINA_HOME_DIR: &str = ".machina";

/// The sub directory of the machina home where named lock files live
pub const LOCKS_SUBDIR: &str = "locks";

/// The file in a machine's data directory that records it was provisioned
pub const PROVISION_SENTINEL_FILENAME: &str = "action_provision";

/// The lock file in a machine's data directory that guards lifecycle actions
pub const MACHINE_LOCK_FILENAME: &str = "action.lock";

/// The extension given to named lock files
pub const LOCK_FILE_EXTENSION: &str = "lock";
