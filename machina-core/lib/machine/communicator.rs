use std::time::Duration;

use async_trait::async_trait;

use crate::config::DEFAULT_READY_POLL_INTERVAL;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Talks to the guest once it is up.
#[async_trait]
pub trait Communicator: Send + Sync {
    /// Returns true if the guest accepts commands right now.
    async fn ready(&self) -> bool;

    /// Waits until the guest accepts commands or `timeout` elapses.
    ///
    /// Returns false on timeout. The default implementation polls [`Communicator::ready`].
    async fn wait_for_ready(&self, timeout: Duration) -> bool {
        let poll = async {
            loop {
                if self.ready().await {
                    return;
                }
                tokio::time::sleep(DEFAULT_READY_POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, poll).await.is_ok()
    }
}
