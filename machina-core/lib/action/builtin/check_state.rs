//! Guards that stop the chain when the machine is not in the state later steps need.

use async_trait::async_trait;

use crate::{
    action::{Action, Environment, Next, StepSpec},
    machine::MachineState,
    MachinaError, MachinaResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Fails with [`MachinaError::MachineNotCreated`] unless the machine exists.
pub struct CheckCreated {
    next: Next,
}

/// Fails with [`MachinaError::MachineNotRunning`] unless the machine is running.
pub struct CheckRunning {
    next: Next,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl CheckCreated {
    /// The step name.
    pub const NAME: &'static str = "check_created";

    /// Creates the step spec.
    pub fn spec() -> StepSpec {
        StepSpec::new(Self::NAME, |next, _env| CheckCreated { next })
    }
}

impl CheckRunning {
    /// The step name.
    pub const NAME: &'static str = "check_running";

    /// Creates the step spec.
    pub fn spec() -> StepSpec {
        StepSpec::new(Self::NAME, |next, _env| CheckRunning { next })
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Action for CheckCreated {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        let machine = env.machine()?;
        if machine.state().await? == MachineState::NotCreated {
            return Err(MachinaError::MachineNotCreated(machine.get_name().clone()));
        }

        self.next.call(env).await
    }
}

#[async_trait]
impl Action for CheckRunning {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        let machine = env.machine()?;
        if machine.state().await? != MachineState::Running {
            return Err(MachinaError::MachineNotRunning(machine.get_name().clone()));
        }

        self.next.call(env).await
    }
}
