use std::{
    path::PathBuf,
    sync::{Arc, PoisonError, RwLock},
};

use getset::Getters;
use machina_utils::{MACHINE_LOCK_FILENAME, PROVISION_SENTINEL_FILENAME};
use typed_builder::TypedBuilder;

use crate::{config::MachineConfig, MachinaError, MachinaResult};

use super::{
    Communicator, GuestCapabilities, MachineState, ProviderDriver, ProvisionerRegistry,
    SyncedFolderRegistry,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A machine managed by the pipeline, together with the collaborators that act on it.
#[derive(TypedBuilder, Getters)]
#[getset(get = "pub with_prefix")]
pub struct Machine {
    /// The machine name
    #[builder(setter(into))]
    name: String,

    /// The directory holding the machine's local state
    #[builder(setter(into))]
    data_dir: PathBuf,

    /// The machine configuration
    #[builder(default)]
    config: MachineConfig,

    /// The provider id, set once the machine is created
    #[builder(default, setter(skip))]
    #[getset(skip)]
    id: RwLock<Option<String>>,

    /// The hypervisor driver
    provider: Arc<dyn ProviderDriver>,

    /// The guest capability dispatcher
    #[builder(default, setter(strip_option))]
    #[getset(skip)]
    guest: Option<Arc<dyn GuestCapabilities>>,

    /// The communicator
    #[builder(default, setter(strip_option))]
    #[getset(skip)]
    communicator: Option<Arc<dyn Communicator>>,

    /// Provisioner implementations by type
    #[builder(default)]
    provisioners: ProvisionerRegistry,

    /// Synced folder implementations by type
    #[builder(default)]
    synced_folder_plugins: SyncedFolderRegistry,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Machine {
    /// Returns the provider id of the machine, if it was created.
    pub fn id(&self) -> Option<String> {
        self.id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records the provider id of the machine.
    pub fn set_id(&self, id: Option<String>) {
        *self.id.write().unwrap_or_else(PoisonError::into_inner) = id;
    }

    /// Asks the provider for the current state.
    pub async fn state(&self) -> MachinaResult<MachineState> {
        self.provider.state().await
    }

    /// Returns the guest capability dispatcher.
    pub fn guest(&self) -> MachinaResult<Arc<dyn GuestCapabilities>> {
        self.guest
            .clone()
            .ok_or(MachinaError::MissingEnvironment("guest"))
    }

    /// Returns the communicator.
    pub fn communicator(&self) -> MachinaResult<Arc<dyn Communicator>> {
        self.communicator
            .clone()
            .ok_or(MachinaError::MissingEnvironment("communicator"))
    }

    /// Returns the path of the lock file guarding lifecycle actions on this machine.
    pub fn lock_path(&self) -> PathBuf {
        self.data_dir.join(MACHINE_LOCK_FILENAME)
    }

    /// Returns the path of the provisioning sentinel file.
    pub fn sentinel_path(&self) -> PathBuf {
        self.data_dir.join(PROVISION_SENTINEL_FILENAME)
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("name", &self.name)
            .field("id", &self.id())
            .field("data_dir", &self.data_dir)
            .finish()
    }
}
