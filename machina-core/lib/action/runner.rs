//! Running chains.

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;

use crate::MachinaResult;

use super::{Builder, Chain, Environment, HookDispatcher, HookRegistry, StepSpec};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Runs builders and chains against an environment.
///
/// The runner fills in environment defaults, applies registered hooks to primary builders and,
/// when the chain fails, records the error in the environment and runs the recovery pass before
/// returning the error.
#[derive(Clone, Default)]
pub struct Runner {
    hooks: Arc<HookRegistry>,
    globals: Arc<Environment>,
}

/// Something a runner can run.
pub enum Runnable {
    /// A builder, compiled before running
    Builder(Builder),

    /// An already compiled chain
    Chain(Chain),

    /// A single step
    Step(StepSpec),
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Runner {
    /// Creates a runner without hooks or globals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the given hook registry.
    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Merges `globals` into every environment this runner runs, without overwriting keys the
    /// caller set.
    pub fn with_globals(mut self, globals: Environment) -> Self {
        self.globals = Arc::new(globals);
        self
    }

    /// Returns the hook registry.
    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Runs a builder, chain or step against `env` and returns the resulting environment.
    ///
    /// ## Arguments
    /// * `runnable` - What to run
    /// * `env` - The environment for this run
    ///
    /// ## Errors
    /// Returns the error of the first failing step, after every entered step was given the
    /// chance to recover.
    ///
    /// ## Example
    /// ```no_run
    /// use machina_core::action::{lifecycle, Environment, Runner};
    ///
    /// # async fn example() -> anyhow::Result<()> {
    /// let runner = Runner::new();
    /// let env = Environment::new().with_action_name(lifecycle::HALT);
    /// runner.run(lifecycle::halt(), env).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run(
        &self,
        runnable: impl Into<Runnable>,
        mut env: Environment,
    ) -> MachinaResult<Environment> {
        env.merge_defaults(&self.globals);
        if env.action_runner.is_none() {
            env.action_runner = Some(self.clone());
        }
        if env.hook.is_none() {
            env.hook = Some(Arc::new(self.clone()));
        }

        let chain = match runnable.into() {
            Runnable::Builder(mut builder) => {
                self.apply_hooks(&mut builder, &env)?;
                builder.to_app(&env)
            }
            Runnable::Chain(chain) => chain,
            Runnable::Step(spec) => Builder::build(spec).to_app(&env),
        };

        let name = env.action_name.clone().unwrap_or_else(|| "anonymous".to_string());
        tracing::debug!("running action: {}", name);

        match chain.call(&mut env).await {
            Ok(()) => {
                tracing::debug!("finished action: {}", name);
                Ok(env)
            }
            Err(e) => {
                tracing::error!("action {} failed: {}", name, e);
                env.error = Some(e.clone());
                chain.recover(&mut env).await;
                Err(e)
            }
        }
    }

    fn apply_hooks(&self, builder: &mut Builder, env: &Environment) -> MachinaResult<()> {
        if !builder.is_primary() {
            return Ok(());
        }

        if let Some(action_name) = &env.action_name {
            let hook = self.hooks.hook_for(action_name);
            if !hook.is_empty() {
                tracing::info!("applying hooks for action: {}", action_name);
                hook.apply(builder, None)?;
            }
        }

        let mut seen = HashSet::new();
        let step_names: Vec<String> = builder
            .names()
            .into_iter()
            .filter(|step_name| seen.insert(*step_name))
            .map(String::from)
            .collect();

        for step_name in step_names {
            if env.action_name.as_deref() == Some(step_name.as_str()) {
                continue;
            }

            let hook = self.hooks.hook_for(&step_name);
            if !hook.is_empty() {
                tracing::info!("applying hooks for step: {}", step_name);
                hook.apply(builder, Some(&step_name))?;
            }
        }

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl HookDispatcher for Runner {
    async fn call(
        &self,
        name: &str,
        mut env: Environment,
        callable: Option<Builder>,
    ) -> MachinaResult<Environment> {
        let mut builder = callable.unwrap_or_default();
        builder.set_primary(true);
        env.action_name = Some(name.to_string());

        self.run(builder, env).await
    }
}

impl From<Builder> for Runnable {
    fn from(builder: Builder) -> Self {
        Self::Builder(builder)
    }
}

impl From<Chain> for Runnable {
    fn from(chain: Chain) -> Self {
        Self::Chain(chain)
    }
}

impl From<StepSpec> for Runnable {
    fn from(spec: StepSpec) -> Self {
        Self::Step(spec)
    }
}
