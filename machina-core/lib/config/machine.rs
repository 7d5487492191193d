use std::{collections::BTreeMap, time::Duration};

use getset::Getters;
use typed_builder::TypedBuilder;

use super::{ProvisionerEntry, SyncedFolder};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The configuration of a single machine, as produced by the configuration loader.
#[derive(Debug, Clone, TypedBuilder, Getters)]
#[getset(get = "pub with_prefix")]
pub struct MachineConfig {
    /// The provider driving this machine, e.g. `virtualbox`
    #[builder(default, setter(into))]
    provider: String,

    /// The box the machine is created from
    #[builder(default, setter(strip_option, into))]
    box_name: Option<String>,

    /// A direct URL to the box, skipping the catalog lookup
    #[builder(default, setter(strip_option, into))]
    box_url: Option<String>,

    /// A version constraint for the box
    #[builder(default, setter(strip_option, into))]
    box_version: Option<String>,

    /// The hostname to set inside the guest
    #[builder(default, setter(strip_option, into))]
    hostname: Option<String>,

    /// How long to wait for the machine to become ready after booting
    #[builder(default = crate::utils::get_boot_timeout())]
    boot_timeout: Duration,

    /// Provisioners in configuration order
    #[builder(default)]
    provisioners: Vec<ProvisionerEntry>,

    /// Synced folders keyed by id
    #[builder(default)]
    synced_folders: BTreeMap<String, SyncedFolder>,
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for MachineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
