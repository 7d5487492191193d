use async_trait::async_trait;
use serde_json::Value;

use crate::MachinaResult;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Dispatches named capabilities of the guest operating system.
#[async_trait]
pub trait GuestCapabilities: Send + Sync {
    /// Returns true if the guest supports the capability.
    fn has_capability(&self, name: &str) -> bool;

    /// Invokes the capability.
    ///
    /// Implementations return [`MachinaError::CapabilityNotFound`](crate::MachinaError::CapabilityNotFound)
    /// for capabilities they do not have.
    async fn capability(&self, name: &str, args: Vec<Value>) -> MachinaResult<Value>;
}
