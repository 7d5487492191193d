//! Default values shared across machina.

use std::{path::PathBuf, sync::LazyLock};

use crate::MACHINA_HOME_DIR;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The default machina home directory, `~/.machina`.
///
/// Falls back to a relative `.machina` directory when the home directory cannot be determined.
pub static DEFAULT_MACHINA_HOME: LazyLock<PathBuf> = LazyLock::new(|| {
    dirs::home_dir()
        .map(|home| home.join(MACHINA_HOME_DIR))
        .unwrap_or_else(|| PathBuf::from(MACHINA_HOME_DIR))
});
