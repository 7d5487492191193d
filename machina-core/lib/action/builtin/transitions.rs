//! Steps that move the machine between provider states.

use async_trait::async_trait;

use crate::{
    action::{Action, Environment, Next, StepSpec},
    machine::MachineState,
    MachinaError, MachinaResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Creates the machine and records its id.
///
/// If anything after this step fails, a machine that was left half created is destroyed again.
/// Interrupts are the exception: the user may want to inspect what was created.
pub struct Create {
    next: Next,
}

/// Boots the machine.
pub struct Boot {
    next: Next,
}

/// Halts the machine.
pub struct Halt {
    next: Next,
    force: bool,
}

/// Destroys the machine and forgets its id.
pub struct Destroy {
    next: Next,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Create {
    /// The step name.
    pub const NAME: &'static str = "create";

    /// Creates the step spec.
    pub fn spec() -> StepSpec {
        StepSpec::new(Self::NAME, |next, _env| Create { next })
    }
}

impl Boot {
    /// The step name.
    pub const NAME: &'static str = "boot";

    /// Creates the step spec.
    pub fn spec() -> StepSpec {
        StepSpec::new(Self::NAME, |next, _env| Boot { next })
    }
}

impl Halt {
    /// The step name.
    pub const NAME: &'static str = "halt";

    /// Asks the guest to shut down.
    pub fn spec() -> StepSpec {
        Self::build_spec(false)
    }

    /// Powers the machine off.
    pub fn spec_force() -> StepSpec {
        Self::build_spec(true)
    }

    fn build_spec(force: bool) -> StepSpec {
        StepSpec::new(Self::NAME, move |next, _env| Halt { next, force })
    }
}

impl Destroy {
    /// The step name.
    pub const NAME: &'static str = "destroy";

    /// Creates the step spec.
    pub fn spec() -> StepSpec {
        StepSpec::new(Self::NAME, |next, _env| Destroy { next })
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Action for Create {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        let machine = env.machine()?;
        env.ui().info(&format!("creating machine: {}", machine.get_name()));

        let id = machine.get_provider().create().await?;
        tracing::info!("created machine {} with id {}", machine.get_name(), id);
        machine.set_id(Some(id));

        self.next.call(env).await
    }

    async fn recover(&self, env: &mut Environment) {
        if matches!(env.error, Some(MachinaError::Interrupted)) {
            tracing::info!("not destroying machine after interrupt");
            return;
        }

        let Ok(machine) = env.machine() else {
            return;
        };

        match machine.state().await {
            Ok(MachineState::NotCreated) => {}
            Ok(_) => {
                env.ui()
                    .error("an error occurred, destroying the partially created machine");
                if let Err(e) = machine.get_provider().destroy().await {
                    tracing::error!("failed to destroy machine {}: {}", machine.get_name(), e);
                    return;
                }
                machine.set_id(None);
            }
            Err(e) => tracing::error!("failed to read state of {}: {}", machine.get_name(), e),
        }
    }
}

#[async_trait]
impl Action for Boot {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        let machine = env.machine()?;
        env.ui().info(&format!("booting machine: {}", machine.get_name()));
        machine.get_provider().boot().await?;

        self.next.call(env).await
    }
}

#[async_trait]
impl Action for Halt {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        let machine = env.machine()?;
        if self.force {
            env.ui().info("forcing shutdown of machine");
        } else {
            env.ui().info("attempting graceful shutdown of machine");
        }

        machine.get_provider().halt(self.force).await?;
        self.next.call(env).await
    }
}

#[async_trait]
impl Action for Destroy {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        let machine = env.machine()?;
        env.ui().info(&format!("destroying machine: {}", machine.get_name()));

        machine.get_provider().destroy().await?;
        machine.set_id(None);

        self.next.call(env).await
    }
}
