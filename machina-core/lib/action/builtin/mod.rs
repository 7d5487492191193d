//! Built-in steps.
//!
//! Every step type has a `NAME` constant, which is the name builders and hooks refer to, and one
//! or more `spec` constructors that return the [`StepSpec`](super::StepSpec) to add to a builder.

mod call;
mod check_state;
mod confirm;
mod env_set;
mod handle_box;
mod is_env_set;
mod is_state;
mod lock;
mod message;
mod provision;
mod provisioner_cleanup;
mod set_hostname;
mod synced_folders;
mod transitions;
mod wait_for_communicator;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use call::*;
pub use check_state::*;
pub use confirm::*;
pub use env_set::*;
pub use handle_box::*;
pub use is_env_set::*;
pub use is_state::*;
pub use lock::*;
pub use message::*;
pub use provision::*;
pub use provisioner_cleanup::*;
pub use set_hostname::*;
pub use synced_folders::*;
pub use transitions::*;
pub use wait_for_communicator::*;
