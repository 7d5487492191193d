use async_trait::async_trait;

use crate::{
    action::{Action, Environment, Next, StepSpec},
    machine::MachineState,
    MachinaResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Sets `result` to whether the machine is in the given state.
pub struct IsState {
    next: Next,
    check: MachineState,
    invert: bool,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl IsState {
    /// The step name.
    pub const NAME: &'static str = "is_state";

    /// Checks that the machine is in `check`.
    pub fn spec(check: MachineState) -> StepSpec {
        Self::build_spec(check, false)
    }

    /// Checks that the machine is not in `check`.
    pub fn spec_not(check: MachineState) -> StepSpec {
        Self::build_spec(check, true)
    }

    fn build_spec(check: MachineState, invert: bool) -> StepSpec {
        StepSpec::new(Self::NAME, move |next, _env| IsState {
            next,
            check: check.clone(),
            invert,
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Action for IsState {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        let state = env.machine()?.state().await?;
        tracing::debug!("machine state: {}, checking for: {}", state, self.check);

        env.result = Some((state == self.check) != self.invert);
        self.next.call(env).await
    }
}
