//! Leveled user output and prompts.
//!
//! Steps never print directly. They report through the [`Ui`] found in the environment, which is
//! silent when the caller did not provide one.

use console::{style, Term};

use crate::{MachinaError, MachinaResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The level of a UI message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiLevel {
    /// Regular progress information
    Info,

    /// Extra detail
    Detail,

    /// Output produced by the machine or a collaborator
    Output,

    /// Something completed
    Success,

    /// Something looks off but the action continues
    Warn,

    /// Something failed
    Error,
}

/// A sink for user-facing output.
pub trait Ui: Send + Sync {
    /// Shows a message at the given level.
    fn say(&self, level: UiLevel, message: &str);

    /// Asks the user a question and blocks until it is answered.
    fn ask(&self, prompt: &str) -> MachinaResult<String>;

    /// Shows an info message.
    fn info(&self, message: &str) {
        self.say(UiLevel::Info, message)
    }

    /// Shows a detail message.
    fn detail(&self, message: &str) {
        self.say(UiLevel::Detail, message)
    }

    /// Shows output.
    fn output(&self, message: &str) {
        self.say(UiLevel::Output, message)
    }

    /// Shows a success message.
    fn success(&self, message: &str) {
        self.say(UiLevel::Success, message)
    }

    /// Shows a warning.
    fn warn(&self, message: &str) {
        self.say(UiLevel::Warn, message)
    }

    /// Shows an error.
    fn error(&self, message: &str) {
        self.say(UiLevel::Error, message)
    }
}

/// A UI that drops all output and cannot ask questions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentUi;

/// A UI writing styled lines to the terminal.
#[derive(Debug, Clone)]
pub struct BasicUi {
    /// Prefix shown before every message, usually the machine name
    prefix: Option<String>,
    out: Term,
    err: Term,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl BasicUi {
    /// Creates a UI writing to stdout and stderr.
    pub fn new() -> Self {
        Self {
            prefix: None,
            out: Term::stdout(),
            err: Term::stderr(),
        }
    }

    /// Prefixes every message with `==> {prefix}:`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    fn format(&self, message: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("==> {}: {}", prefix, message),
            None => message.to_string(),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Ui for SilentUi {
    fn say(&self, _level: UiLevel, _message: &str) {}

    fn ask(&self, _prompt: &str) -> MachinaResult<String> {
        Err(MachinaError::NonInteractive)
    }
}

impl Ui for BasicUi {
    fn say(&self, level: UiLevel, message: &str) {
        let line = self.format(message);
        let result = match level {
            UiLevel::Info | UiLevel::Output => self.out.write_line(&line),
            UiLevel::Detail => self.out.write_line(&style(line).dim().to_string()),
            UiLevel::Success => self.out.write_line(&style(line).green().to_string()),
            UiLevel::Warn => self.err.write_line(&style(line).yellow().to_string()),
            UiLevel::Error => self.err.write_line(&style(line).red().to_string()),
        };

        if let Err(e) = result {
            tracing::warn!("failed to write ui message: {}", e);
        }
    }

    fn ask(&self, prompt: &str) -> MachinaResult<String> {
        if !self.out.is_term() {
            return Err(MachinaError::NonInteractive);
        }

        self.out.write_str(&self.format(prompt))?;
        Ok(self.out.read_line()?)
    }
}

impl Default for BasicUi {
    fn default() -> Self {
        Self::new()
    }
}
