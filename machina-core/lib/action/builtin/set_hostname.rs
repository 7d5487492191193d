use async_trait::async_trait;
use serde_json::Value;

use crate::{
    action::{Action, Environment, Next, StepSpec},
    MachinaResult,
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The guest capability that changes the hostname.
pub const CHANGE_HOST_NAME_CAPABILITY: &str = "change_host_name";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Sets the configured hostname inside the guest once the rest of the chain has run.
pub struct SetHostname {
    next: Next,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl SetHostname {
    /// The step name.
    pub const NAME: &'static str = "set_hostname";

    /// Creates the step spec.
    pub fn spec() -> StepSpec {
        StepSpec::new(Self::NAME, |next, _env| SetHostname { next })
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Action for SetHostname {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        self.next.call(env).await?;

        let machine = env.machine()?;
        let Some(hostname) = machine.get_config().get_hostname() else {
            return Ok(());
        };

        let ui = env.ui();
        let guest = machine.guest()?;
        if !guest.has_capability(CHANGE_HOST_NAME_CAPABILITY) {
            ui.warn(&format!(
                "guest does not support changing the hostname, not setting it to: {}",
                hostname
            ));
            return Ok(());
        }

        ui.info(&format!("setting hostname: {}", hostname));
        guest
            .capability(
                CHANGE_HOST_NAME_CAPABILITY,
                vec![Value::String(hostname.clone())],
            )
            .await?;

        Ok(())
    }
}
