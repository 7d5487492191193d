use async_trait::async_trait;

use crate::{
    action::{Action, Environment, Next, StepSpec},
    ui::UiLevel,
    MachinaResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Shows a message, then continues.
pub struct Message {
    next: Next,
    level: UiLevel,
    text: String,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Message {
    /// The step name.
    pub const NAME: &'static str = "message";

    /// Shows `text` at info level.
    pub fn spec(text: impl Into<String>) -> StepSpec {
        Self::spec_with_level(UiLevel::Info, text)
    }

    /// Shows `text` at the given level.
    pub fn spec_with_level(level: UiLevel, text: impl Into<String>) -> StepSpec {
        let text = text.into();
        StepSpec::new(Self::NAME, move |next, _env| Message {
            next,
            level,
            text: text.clone(),
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Action for Message {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        env.ui().say(self.level, &self.text);
        self.next.call(env).await
    }
}
