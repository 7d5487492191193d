//! Configuration types and helpers.

mod defaults;
mod machine;
mod provisioner;
mod synced_folder;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use defaults::*;
pub use machine::*;
pub use provisioner::*;
pub use synced_folder::*;
