use async_trait::async_trait;

use crate::{
    action::{Action, Environment, Next, StepSpec},
    MachinaResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Asks the user a yes/no question and stores the answer in `result`.
///
/// The answer is also stored under `<force_key>_result`. The step always continues the chain;
/// acting on the answer is left to an enclosing [`Call`](super::Call).
pub struct Confirm {
    next: Next,
    message: String,
    force_key: Option<String>,
    allowed: Option<Vec<String>>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Confirm {
    /// The step name.
    pub const NAME: &'static str = "confirm";

    /// Creates the step spec.
    ///
    /// ## Arguments
    /// * `message` - The question
    /// * `force_key` - If this environment key is truthy, the answer is yes without asking
    /// * `allowed` - If set, the question is repeated until one of these answers is given
    pub fn spec(
        message: impl Into<String>,
        force_key: Option<&str>,
        allowed: Option<Vec<String>>,
    ) -> StepSpec {
        let message = message.into();
        let force_key = force_key.map(String::from);

        StepSpec::new(Self::NAME, move |next, _env| Confirm {
            next,
            message: message.clone(),
            force_key: force_key.clone(),
            allowed: allowed.clone(),
        })
    }

    async fn ask(&self, env: &Environment) -> MachinaResult<String> {
        if let Some(force_key) = &self.force_key {
            if env.is_truthy(force_key) {
                return Ok("Y".to_string());
            }
        }

        // Prompts block on the terminal, so keep them off the async workers
        let ui = env.ui();
        let message = self.message.clone();
        let allowed = self.allowed.clone();
        tokio::task::spawn_blocking(move || -> MachinaResult<String> {
            loop {
                let choice = ui.ask(&message)?.trim().to_string();
                match &allowed {
                    Some(allowed) if !allowed.contains(&choice) => continue,
                    _ => return Ok(choice),
                }
            }
        })
        .await?
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Action for Confirm {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        let choice = self.ask(env).await?;
        let confirmed = choice.to_uppercase() == "Y";

        env.result = Some(confirmed);
        if let Some(force_key) = &self.force_key {
            env.insert(format!("{}_result", force_key), confirmed);
        }

        self.next.call(env).await
    }
}
