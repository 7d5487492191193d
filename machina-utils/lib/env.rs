//! Utility functions for working with environment variables.

use std::path::PathBuf;

use crate::{DEFAULT_MACHINA_HOME, LOCKS_SUBDIR};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Environment variable for the machina home directory
pub const MACHINA_HOME_ENV_VAR: &str = "MACHINA_HOME";

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Returns the path to the machina home directory.
/// If the MACHINA_HOME environment variable is set, returns that path.
/// Otherwise, returns the default machina home path.
pub fn get_machina_home_path() -> PathBuf {
    if let Ok(machina_home) = std::env::var(MACHINA_HOME_ENV_VAR) {
        PathBuf::from(machina_home)
    } else {
        DEFAULT_MACHINA_HOME.to_owned()
    }
}

/// Returns the directory holding named lock files under the machina home.
pub fn get_machina_locks_path() -> PathBuf {
    get_machina_home_path().join(LOCKS_SUBDIR)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
