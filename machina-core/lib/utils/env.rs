//! Utility functions for working with environment variables.

use std::time::Duration;

use crate::config::DEFAULT_BOOT_TIMEOUT;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Environment variable overriding the boot timeout, in seconds
pub const MACHINA_BOOT_TIMEOUT_ENV_VAR: &str = "MACHINA_BOOT_TIMEOUT";

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Returns how long to wait for a machine to boot.
/// If the MACHINA_BOOT_TIMEOUT environment variable holds a number of seconds, returns that.
/// Otherwise, returns the default boot timeout.
pub fn get_boot_timeout() -> Duration {
    match std::env::var(MACHINA_BOOT_TIMEOUT_ENV_VAR) {
        Ok(value) => match value.trim().parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                tracing::warn!(
                    "ignoring invalid {}: {}",
                    MACHINA_BOOT_TIMEOUT_ENV_VAR,
                    value
                );
                DEFAULT_BOOT_TIMEOUT
            }
        },
        Err(_) => DEFAULT_BOOT_TIMEOUT,
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
