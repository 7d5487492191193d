use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::{
    action::{Action, Builder, Chain, Environment, Middleware, Next, StepSpec},
    MachinaResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Picks the steps to run after the inner chain, based on the environment it produced.
pub type Decision = Arc<dyn Fn(&Environment, &mut Builder) + Send + Sync>;

/// Runs a nested chain, then lets a decision callback choose the steps that run next.
///
/// The chosen steps run before the rest of the outer chain, against the environment the nested
/// chain produced. Everything the nested run and the chosen steps set is merged back into the
/// outer environment.
pub struct Call {
    next: Next,
    callable: Builder,
    decide: Decision,
    child: Mutex<Option<Chain>>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Call {
    /// The step name.
    pub const NAME: &'static str = "call";

    /// Creates the step spec.
    ///
    /// ## Arguments
    /// * `callable` - The inner step or builder
    /// * `decide` - Receives the inner result and a fresh builder to queue follow-up steps on
    ///
    /// ## Example
    /// ```no_run
    /// use machina_core::{
    ///     action::builtin::{Call, IsState, Message},
    ///     machine::MachineState,
    /// };
    ///
    /// let spec = Call::spec(IsState::spec(MachineState::Running), |env, builder| {
    ///     if env.result != Some(true) {
    ///         builder.use_step(Message::spec("machine is not running"));
    ///     }
    /// });
    /// ```
    pub fn spec<F>(callable: impl Into<Middleware>, decide: F) -> StepSpec
    where
        F: Fn(&Environment, &mut Builder) + Send + Sync + 'static,
    {
        let callable = Builder::build(callable);
        let decide: Decision = Arc::new(decide);

        StepSpec::new(Self::NAME, move |next, _env| Call {
            next,
            callable: callable.clone(),
            decide: decide.clone(),
            child: Mutex::new(None),
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Action for Call {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        let runner = env.runner();
        let new_env = runner.run(self.callable.clone(), env.clone()).await?;

        let mut builder = Builder::new();
        (self.decide)(&new_env, &mut builder);
        builder.use_step(StepSpec::forward(self.next.clone()));

        let child = builder.to_app(&new_env);
        *self.child.lock().unwrap_or_else(PoisonError::into_inner) = Some(child.clone());

        let final_env = runner.run(child, new_env).await?;
        env.merge(final_env);

        Ok(())
    }

    async fn recover(&self, env: &mut Environment) {
        let child = self
            .child
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        if let Some(child) = child {
            child.recover(env).await;
        }
    }
}
