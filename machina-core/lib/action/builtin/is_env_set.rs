use async_trait::async_trait;

use crate::{
    action::{Action, Environment, Next, StepSpec},
    MachinaResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Sets `result` to whether an environment key is truthy.
pub struct IsEnvSet {
    next: Next,
    key: String,
    invert: bool,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl IsEnvSet {
    /// The step name.
    pub const NAME: &'static str = "is_env_set";

    /// Checks that `key` is truthy.
    pub fn spec(key: impl Into<String>) -> StepSpec {
        Self::build_spec(key.into(), false)
    }

    /// Checks that `key` is not truthy.
    pub fn spec_not(key: impl Into<String>) -> StepSpec {
        Self::build_spec(key.into(), true)
    }

    fn build_spec(key: String, invert: bool) -> StepSpec {
        StepSpec::new(Self::NAME, move |next, _env| IsEnvSet {
            next,
            key: key.clone(),
            invert,
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Action for IsEnvSet {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        env.result = Some(env.is_truthy(&self.key) != self.invert);
        self.next.call(env).await
    }
}
