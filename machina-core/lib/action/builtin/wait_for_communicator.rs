use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::{
    action::{Action, Environment, Next, StepSpec},
    config::{DEFAULT_INTERRUPT_POLL_INTERVAL, DEFAULT_STATE_POLL_INTERVAL},
    machine::{Machine, MachineState},
    MachinaError, MachinaResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Waits for the machine's communicator to become ready after boot.
///
/// Two background tasks race each other: one waits for the communicator, the other polls the
/// machine state and reports the first state outside of the allowed ones. Whichever finishes
/// first decides the outcome. If the run is interrupted while waiting, the step returns without
/// continuing the chain. Both tasks are aborted on every way out of the step.
pub struct WaitForCommunicator {
    next: Next,
    valid_states: Option<Vec<MachineState>>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl WaitForCommunicator {
    /// The step name.
    pub const NAME: &'static str = "wait_for_communicator";

    /// Creates the step spec.
    ///
    /// ## Arguments
    /// * `valid_states` - The states the machine may be in while booting. `None` skips the state
    ///   watcher.
    pub fn spec(valid_states: Option<Vec<MachineState>>) -> StepSpec {
        StepSpec::new(Self::NAME, move |next, _env| WaitForCommunicator {
            next,
            valid_states: valid_states.clone(),
        })
    }

    async fn wait(&self, env: &Environment, machine: Arc<Machine>) -> MachinaResult<bool> {
        let communicator = machine.communicator()?;
        let timeout = *machine.get_config().get_boot_timeout();

        let mut ready: JoinHandle<bool> =
            tokio::spawn(async move { communicator.wait_for_ready(timeout).await });
        let mut watcher = tokio::spawn(watch_state(machine, self.valid_states.clone()));

        let _abort = scopeguard::guard(
            (ready.abort_handle(), watcher.abort_handle()),
            |(ready, watcher)| {
                ready.abort();
                watcher.abort();
            },
        );

        let mut interrupt_poll = tokio::time::interval(DEFAULT_INTERRUPT_POLL_INTERVAL);
        loop {
            tokio::select! {
                result = &mut ready => {
                    if !result? {
                        return Err(MachinaError::BootTimeout(timeout));
                    }
                    return Ok(true);
                }
                result = &mut watcher => {
                    let invalid = result??;
                    return Err(MachinaError::BootBadState {
                        valid: join_states(self.valid_states.as_deref().unwrap_or_default()),
                        invalid: invalid.to_string(),
                    });
                }
                _ = interrupt_poll.tick() => {
                    if env.is_interrupted() {
                        tracing::info!("interrupted while waiting for the machine to boot");
                        return Ok(false);
                    }
                }
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Action for WaitForCommunicator {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        let machine = env.machine()?;
        env.ui().output("waiting for machine to boot, this may take a few minutes...");

        if !self.wait(env, machine).await? {
            return Ok(());
        }

        env.ui().output("machine booted and ready");
        self.next.call(env).await
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

/// Resolves with the first observed state that is not valid. Never resolves without states.
async fn watch_state(
    machine: Arc<Machine>,
    valid_states: Option<Vec<MachineState>>,
) -> MachinaResult<MachineState> {
    let Some(valid_states) = valid_states else {
        return std::future::pending().await;
    };

    loop {
        let state = machine.state().await?;
        if !valid_states.contains(&state) {
            tracing::debug!("machine entered invalid state while booting: {}", state);
            return Ok(state);
        }

        tokio::time::sleep(DEFAULT_STATE_POLL_INTERVAL).await;
    }
}

fn join_states(states: &[MachineState]) -> String {
    states
        .iter()
        .map(MachineState::id)
        .collect::<Vec<_>>()
        .join(", ")
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
