use async_trait::async_trait;

use crate::MachinaResult;

use super::MachineState;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Drives the hypervisor behind a machine.
#[async_trait]
pub trait ProviderDriver: Send + Sync {
    /// Returns the current state of the machine.
    async fn state(&self) -> MachinaResult<MachineState>;

    /// Creates the machine and returns its id.
    async fn create(&self) -> MachinaResult<String>;

    /// Boots a created machine.
    async fn boot(&self) -> MachinaResult<()>;

    /// Halts a running machine, forcefully if `force` is set.
    async fn halt(&self, force: bool) -> MachinaResult<()>;

    /// Destroys the machine.
    async fn destroy(&self) -> MachinaResult<()>;
}
