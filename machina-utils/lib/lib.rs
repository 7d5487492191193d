//! `machina-utils` is a library containing general utilities for the machina project.
//!
//! It holds the pieces that do not depend on the action pipeline itself:
//! - [`lock`] - Non-blocking, exclusive file locks that also detect contention inside one process
//! - [`sync`] - A registry of per-key async mutexes
//! - [`env`] - Environment variable lookups
//! - [`path`] - Well-known path and file names

#![warn(missing_docs)]

mod error;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub mod defaults;
pub mod env;
pub mod lock;
pub mod path;
pub mod sync;

pub use defaults::*;
pub use error::*;
pub use lock::*;
pub use path::*;
pub use sync::*;
