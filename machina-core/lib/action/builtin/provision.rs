use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    action::{keys, Action, Builder, Environment, HookDispatcher, Next, StepSpec},
    config::{ProvisionerEntry, RunMode, PROVISIONER_RUN_HOOK},
    provision::{self, sentinel, sentinel::SentinelState, ProvisionerInstance},
    MachinaResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Runs the configured provisioners once the rest of the chain has brought the machine up.
///
/// Provisioners that run `once` are skipped if the sentinel file says the machine was already
/// provisioned, unless the sentinel is ignored. `provision_types` restricts the run to the
/// provisioners with the given names or types. Each provisioner is run as the
/// `provisioner_run` hook, so plugins can wrap individual runs.
pub struct Provision {
    next: Next,
}

/// Runs a single provisioner. This is the callable dispatched through the `provisioner_run` hook.
pub struct RunProvisioner {
    next: Next,
    instance: ProvisionerInstance,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Provision {
    /// The step name.
    pub const NAME: &'static str = "provision";

    /// Creates the step spec.
    pub fn spec() -> StepSpec {
        StepSpec::new(Self::NAME, |next, _env| Provision { next })
    }

    async fn run_provisioner(
        &self,
        env: &Environment,
        instance: ProvisionerInstance,
    ) -> MachinaResult<()> {
        let hook: Arc<dyn HookDispatcher> = match &env.hook {
            Some(hook) => hook.clone(),
            None => Arc::new(env.runner()),
        };

        let mut run_env = env.clone();
        run_env.insert(keys::PROVISIONER_NAME, instance.get_entry().get_kind().clone());

        let callable = Builder::build(RunProvisioner::spec(instance));
        hook.call(PROVISIONER_RUN_HOOK, run_env, Some(callable)).await?;

        Ok(())
    }
}

impl RunProvisioner {
    /// The step name.
    pub const NAME: &'static str = "run_provisioner";

    /// Creates the step spec.
    pub fn spec(instance: ProvisionerInstance) -> StepSpec {
        StepSpec::new(Self::NAME, move |next, _env| RunProvisioner {
            next,
            instance: instance.clone(),
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Action for Provision {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        let machine = env.machine()?;
        let config_enabled = flag_or_true(env, keys::PROVISION_ENABLED);
        let ignore_sentinel = flag_or_true(env, keys::PROVISION_IGNORE_SENTINEL);
        let instances = provision::instances(&machine)?;

        let sentinel_path = machine.sentinel_path();
        let mut update_sentinel = false;
        match sentinel::read(&sentinel_path, machine.id().as_deref()).await? {
            SentinelState::Missing => {}
            SentinelState::Legacy => {
                tracing::info!("found legacy provision sentinel, provisioning again and upgrading it");
                update_sentinel = true;
            }
            SentinelState::Current => {
                tracing::info!("machine was already provisioned");
                if !ignore_sentinel {
                    env.insert(keys::PROVISION_ENABLED, false);
                }
            }
            SentinelState::Foreign => {
                tracing::info!("provision sentinel belongs to another machine, removing it");
                sentinel::remove(&sentinel_path).await?;
            }
        }

        if !env.contains_key(keys::PROVISION_ENABLED) {
            env.insert(keys::PROVISION_ENABLED, true);
        }

        self.next.call(env).await?;

        let ui = env.ui();
        if !config_enabled {
            ui.info("provisioning is disabled, not running provisioners");
            return Ok(());
        }

        let provision_enabled = env.is_truthy(keys::PROVISION_ENABLED);
        if !provision_enabled {
            ui.info("machine is already provisioned, only running provisioners set to always run");
        }

        if update_sentinel || !tokio::fs::try_exists(&sentinel_path).await? {
            sentinel::write(&sentinel_path, machine.id().as_deref()).await?;
        }

        let types: Option<Vec<String>> = env.get_as(keys::PROVISION_TYPES);
        for instance in instances {
            if !should_run(instance.get_entry(), provision_enabled, types.as_deref()) {
                tracing::debug!("skipping provisioner: {}", instance.get_entry().display_name());
                continue;
            }

            self.run_provisioner(env, instance).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl Action for RunProvisioner {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        let entry = self.instance.get_entry();
        env.ui()
            .info(&format!("running provisioner: {}", entry.display_name()));

        tracing::info!("running provisioner: {}", entry.display_name());
        self.instance.get_provisioner().provision().await?;

        self.next.call(env).await
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn flag_or_true(env: &Environment, key: &str) -> bool {
    !env.contains_key(key) || env.is_truthy(key)
}

/// Decides whether a provisioner takes part in this run.
///
/// `never` provisioners only run when selected by name. Any other provisioner must match the
/// requested types by name or type, and `once` provisioners also need provisioning to be enabled.
fn should_run(entry: &ProvisionerEntry, provision_enabled: bool, types: Option<&[String]>) -> bool {
    let name = entry.get_name().as_deref();

    if *entry.get_run() == RunMode::Never {
        return match (types, name) {
            (Some(types), Some(name)) => types.iter().any(|t| t == name),
            _ => false,
        };
    }

    if let Some(types) = types {
        let selected = types
            .iter()
            .any(|t| t == entry.get_kind() || Some(t.as_str()) == name);
        if !selected {
            return false;
        }
    }

    provision_enabled || *entry.get_run() == RunMode::Always
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
