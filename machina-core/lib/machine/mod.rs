//! The machine and the collaborator contracts the pipeline drives.
//!
//! Providers, guests, communicators, provisioners, box stores and synced folder plugins are
//! implemented outside of this crate. The steps only depend on the traits defined here.

mod boxes;
mod communicator;
mod guest;
mod instance;
mod provider;
mod provisioner;
mod state;
mod synced_folder;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use boxes::*;
pub use communicator::*;
pub use guest::*;
pub use instance::*;
pub use provider::*;
pub use provisioner::*;
pub use state::*;
pub use synced_folder::*;
