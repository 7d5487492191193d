use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    action::{Action, Environment, Next, StepSpec},
    machine::Provisioner,
    provision, MachinaResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// When [`ProvisionerCleanup`] runs relative to the rest of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPlace {
    /// Before the rest of the chain runs
    #[default]
    Before,

    /// After the rest of the chain has run
    After,
}

/// Lets every configured provisioner clean up what it left outside of the machine.
pub struct ProvisionerCleanup {
    next: Next,
    place: CleanupPlace,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ProvisionerCleanup {
    /// The step name.
    pub const NAME: &'static str = "provisioner_cleanup";

    /// Creates the step spec.
    pub fn spec(place: CleanupPlace) -> StepSpec {
        StepSpec::new(Self::NAME, move |next, _env| ProvisionerCleanup { next, place })
    }

    async fn cleanup(&self, env: &Environment) -> MachinaResult<()> {
        let machine = env.machine()?;
        let ui = env.ui();

        let mut cleaned: Vec<Arc<dyn Provisioner>> = Vec::new();
        for instance in provision::instances(&machine)? {
            let provisioner = instance.get_provisioner();
            if cleaned.iter().any(|done| Arc::ptr_eq(done, provisioner)) {
                continue;
            }

            ui.info(&format!(
                "running cleanup tasks for provisioner: {}",
                instance.get_entry().display_name()
            ));
            provisioner.cleanup().await?;
            cleaned.push(provisioner.clone());
        }

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Action for ProvisionerCleanup {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        if self.place == CleanupPlace::Before {
            self.cleanup(env).await?;
        }

        self.next.call(env).await?;

        if self.place == CleanupPlace::After {
            self.cleanup(env).await?;
        }

        Ok(())
    }
}
