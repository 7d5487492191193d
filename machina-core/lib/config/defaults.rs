use std::time::Duration;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// How long to wait for a machine to become ready after booting.
pub const DEFAULT_BOOT_TIMEOUT: Duration = Duration::from_secs(300);

/// How often the boot watcher checks the machine state.
pub const DEFAULT_STATE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How often a communicator checks readiness while waiting.
pub const DEFAULT_READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How often long running steps check the interrupt flag.
pub const DEFAULT_INTERRUPT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// The version written into the provisioning sentinel file.
pub const PROVISION_SENTINEL_VERSION: &str = "1.5";

/// The hook name under which each provisioner run is dispatched.
pub const PROVISIONER_RUN_HOOK: &str = "provisioner_run";
