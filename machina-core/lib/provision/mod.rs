//! Provisioner instantiation, ordering and the provisioning sentinel.

mod order;
pub mod sentinel;

use std::sync::Arc;

use getset::Getters;

use crate::{
    config::ProvisionerEntry,
    machine::{Machine, Provisioner},
    MachinaResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A provisioner together with the configuration entry it was created from.
#[derive(Clone, Getters)]
#[getset(get = "pub with_prefix")]
pub struct ProvisionerInstance {
    /// The provisioner implementation
    provisioner: Arc<dyn Provisioner>,

    /// The configuration entry
    entry: ProvisionerEntry,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Creates the configured provisioners of a machine, in run order.
///
/// Entries whose type has no registered implementation are skipped with a warning. The returned
/// list may contain the same provisioner more than once when it is ordered around `:each`.
pub fn instances(machine: &Machine) -> MachinaResult<Vec<ProvisionerInstance>> {
    let registry = machine.get_provisioners();

    let mut known = Vec::new();
    let mut created = Vec::new();
    for entry in machine.get_config().get_provisioners() {
        match registry.instantiate(entry) {
            Some(provisioner) => {
                known.push(entry.clone());
                created.push(provisioner);
            }
            None => {
                tracing::warn!("no provisioner registered for type: {}", entry.get_kind());
            }
        }
    }

    let order = run_order(&known)?;
    Ok(order
        .into_iter()
        .map(|index| ProvisionerInstance {
            provisioner: created[index].clone(),
            entry: known[index].clone(),
        })
        .collect())
}

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use order::*;
