//! The builders of the machine lifecycle actions.
//!
//! Each builder is primary, so hooks registered under the action name or under one of its step
//! names are applied when it runs. Use [`run`] to run an action under its registered name.
//!
//! ## Example
//! ```no_run
//! use machina_core::action::{
//!     keys,
//!     lifecycle::{self, LifecycleAction},
//!     Environment, Runner,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let runner = Runner::new();
//! let env = Environment::new().with(keys::FORCE_CONFIRM_DESTROY, true);
//! lifecycle::run(&runner, LifecycleAction::Destroy, env).await?;
//! # Ok(())
//! # }
//! ```

use crate::{machine::MachineState, MachinaResult};

use super::{
    builtin::{
        Boot, Call, CheckCreated, CheckRunning, CleanupPlace, Confirm, Create, Destroy, Halt,
        HandleBox, IsState, Lock, Message, Provision, ProvisionerCleanup, SetHostname,
        SyncedFolders, WaitForCommunicator,
    },
    keys, Builder, Environment, Runner, StepSpec,
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The action name of [`up`].
pub const UP: &str = "machine_action_up";

/// The action name of [`halt`].
pub const HALT: &str = "machine_action_halt";

/// The action name of [`destroy`].
pub const DESTROY: &str = "machine_action_destroy";

/// The action name of [`provision`].
pub const PROVISION: &str = "machine_action_provision";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A lifecycle action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    /// Creates, boots and provisions the machine
    Up,

    /// Shuts the machine down
    Halt,

    /// Destroys the machine after confirmation
    Destroy,

    /// Provisions a running machine
    Provision,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl LifecycleAction {
    /// The action name hooks are registered under.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Up => UP,
            Self::Halt => HALT,
            Self::Destroy => DESTROY,
            Self::Provision => PROVISION,
        }
    }

    /// A fresh builder for the action.
    pub fn builder(&self) -> Builder {
        match self {
            Self::Up => up(),
            Self::Halt => halt(),
            Self::Destroy => destroy(),
            Self::Provision => provision(),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Runs a lifecycle action under its action name.
pub async fn run(
    runner: &Runner,
    action: LifecycleAction,
    env: Environment,
) -> MachinaResult<Environment> {
    tracing::info!("running lifecycle action: {}", action.name());
    runner
        .run(action.builder(), env.with_action_name(action.name()))
        .await
}

/// Brings the machine up: adds the box if needed, creates the machine if it does not exist,
/// then prepares synced folders, boots, waits for the communicator, sets the hostname and
/// provisions.
///
/// Unlike [`provision`], `up` respects the provisioning sentinel unless the caller sets
/// `provision_ignore_sentinel`.
pub fn up() -> Builder {
    let mut builder = Builder::new_primary();
    builder
        .use_step(StepSpec::from_fn("up_defaults", |env| {
            if !env.contains_key(keys::PROVISION_IGNORE_SENTINEL) {
                env.insert(keys::PROVISION_IGNORE_SENTINEL, false);
            }
            Ok(())
        }))
        .use_step(HandleBox::spec())
        .use_step(Lock::machine())
        .use_step(Call::spec(
            IsState::spec(MachineState::NotCreated),
            |env, builder| {
                if env.result == Some(true) {
                    builder.use_step(Create::spec());
                }
            },
        ))
        .use_step(Call::spec(
            IsState::spec(MachineState::Running),
            |env, builder| {
                if env.result == Some(true) {
                    builder.use_step(Message::spec("machine is already running"));
                    return;
                }

                builder
                    .use_step(Provision::spec())
                    .use_step(SetHostname::spec())
                    .use_step(SyncedFolders::spec())
                    .use_step(Boot::spec())
                    .use_step(WaitForCommunicator::spec(Some(vec![MachineState::Running])));
            },
        ));

    builder
}

/// Halts the machine, gracefully first and forcefully if it is still running afterwards.
pub fn halt() -> Builder {
    let mut builder = Builder::new_primary();
    builder
        .use_step(CheckCreated::spec())
        .use_step(Lock::machine())
        .use_step(Call::spec(
            IsState::spec(MachineState::Running),
            |env, builder| {
                if env.result != Some(true) {
                    builder.use_step(Message::spec("machine is already halted"));
                    return;
                }

                builder.use_step(Halt::spec()).use_step(Call::spec(
                    IsState::spec(MachineState::Running),
                    |env, builder| {
                        if env.result == Some(true) {
                            builder.use_step(Halt::spec_force());
                        }
                    },
                ));
            },
        ));

    builder
}

/// Destroys the machine once the user confirms, or without asking if `force_confirm_destroy`
/// is set.
pub fn destroy() -> Builder {
    let mut builder = Builder::new_primary();
    builder.use_step(Call::spec(
        IsState::spec(MachineState::NotCreated),
        |env, builder| {
            if env.result == Some(true) {
                builder.use_step(Message::spec("machine is not created"));
                return;
            }

            let confirm = Confirm::spec(
                "are you sure you want to destroy the machine? [y/N]",
                Some(keys::FORCE_CONFIRM_DESTROY),
                None,
            );

            builder.use_step(Call::spec(confirm, |env, builder| {
                if env.result != Some(true) {
                    builder.use_step(Message::spec("machine will not be destroyed"));
                    return;
                }

                builder
                    .use_step(Lock::machine())
                    .use_step(Call::spec(
                        IsState::spec(MachineState::Running),
                        |env, builder| {
                            if env.result == Some(true) {
                                builder.use_step(Halt::spec_force());
                            }
                        },
                    ))
                    .use_step(ProvisionerCleanup::spec(CleanupPlace::Before))
                    .use_step(Destroy::spec());
            }));
        },
    ));

    builder
}

/// Provisions a running machine. The sentinel is ignored unless the caller sets
/// `provision_ignore_sentinel` to false.
pub fn provision() -> Builder {
    let mut builder = Builder::new_primary();
    builder
        .use_step(CheckCreated::spec())
        .use_step(CheckRunning::spec())
        .use_step(Lock::machine())
        .use_step(Provision::spec());

    builder
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
