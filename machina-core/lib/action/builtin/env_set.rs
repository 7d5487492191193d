use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    action::{Action, Environment, Next, StepSpec},
    MachinaResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Merges fixed values into the environment.
pub struct EnvSet {
    next: Next,
    values: HashMap<String, Value>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl EnvSet {
    /// The step name.
    pub const NAME: &'static str = "env_set";

    /// Creates the step spec.
    pub fn spec<K, V>(values: impl IntoIterator<Item = (K, V)>) -> StepSpec
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let values: HashMap<String, Value> = values
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();

        StepSpec::new(Self::NAME, move |next, _env| EnvSet {
            next,
            values: values.clone(),
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Action for EnvSet {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        env.extend(self.values.clone());
        self.next.call(env).await
    }
}
