//! The step protocol and compiled chains.
//!
//! A step implements [`Action`]. It receives the [`Next`] link when it is instantiated and decides
//! itself whether and when to call it, so code before the call runs on the way in and code after
//! it runs on the way out.
//!
//! Every compiled step is wrapped in a link that remembers whether the step was entered. The
//! link's `recover` first recovers the rest of the chain and then the step itself, which gives a
//! recovery pass in reverse entry order that never reaches steps that did not run.

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;

use crate::{MachinaError, MachinaResult};

use super::Environment;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The name given to specs made with [`StepSpec::forward`].
pub const FORWARD_STEP_NAME: &str = "forward";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A unit of work in a chain.
#[async_trait]
pub trait Action: Send + Sync {
    /// Runs the step. Implementations call their [`Next`] to continue the chain, or return
    /// without calling it to stop the chain here.
    async fn call(&self, env: &mut Environment) -> MachinaResult<()>;

    /// Cleans up after a failure further down the chain or in this step.
    ///
    /// Only called if the step was entered. Recovery is best effort: failures are logged, never
    /// returned. The default does nothing.
    async fn recover(&self, _env: &mut Environment) {}
}

/// The rest of the chain, as seen by a step.
#[derive(Clone)]
pub struct Next(Arc<dyn Action>);

/// The compiled form of a builder.
#[derive(Clone)]
pub struct Chain {
    head: Next,
}

/// Creates a step instance given the next link and the environment at compile time.
pub type StepFactory = Arc<dyn Fn(Next, &Environment) -> Box<dyn Action> + Send + Sync>;

/// A named recipe for a step.
///
/// The name is what builder markers and hooks refer to.
#[derive(Clone)]
pub struct StepSpec {
    name: String,
    factory: StepFactory,
}

/// Wraps each compiled step with entry tracking and interrupt checks.
struct Link {
    name: String,
    step: Box<dyn Action>,
    next: Next,
    entered: AtomicBool,
}

/// The end of every chain.
struct Terminal;

/// A synchronous closure followed by the next link.
struct FnStep {
    next: Next,
    f: Arc<dyn Fn(&mut Environment) -> MachinaResult<()> + Send + Sync>,
}

/// Continues into an already compiled chain.
struct Forward {
    target: Next,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Next {
    /// Wraps a step as a link.
    pub fn new(action: impl Action + 'static) -> Self {
        Self(Arc::new(action))
    }

    /// The no-op end of a chain.
    pub fn terminal() -> Self {
        Self::new(Terminal)
    }

    /// Runs the rest of the chain.
    pub async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        self.0.call(env).await
    }

    /// Recovers the rest of the chain.
    pub async fn recover(&self, env: &mut Environment) {
        self.0.recover(env).await
    }
}

impl Chain {
    pub(crate) fn new(head: Next) -> Self {
        Self { head }
    }

    /// Runs the chain. Prefer [`Runner::run`](super::Runner::run), which also performs recovery.
    pub async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        self.head.call(env).await
    }

    /// Recovers every entered step, innermost first.
    pub async fn recover(&self, env: &mut Environment) {
        self.head.recover(env).await
    }

    /// Returns the head of the chain as a link other chains can continue into.
    pub fn as_next(&self) -> Next {
        self.head.clone()
    }
}

impl StepSpec {
    /// Creates a spec from a factory.
    ///
    /// ## Example
    /// ```no_run
    /// use async_trait::async_trait;
    /// use machina_core::{action::{Action, Environment, Next, StepSpec}, MachinaResult};
    ///
    /// struct Greet {
    ///     next: Next,
    /// }
    ///
    /// #[async_trait]
    /// impl Action for Greet {
    ///     async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
    ///         env.ui().info("hello");
    ///         self.next.call(env).await
    ///     }
    /// }
    ///
    /// let spec = StepSpec::new("greet", |next, _env| Greet { next });
    /// ```
    pub fn new<F, A>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(Next, &Environment) -> A + Send + Sync + 'static,
        A: Action + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(move |next: Next, env: &Environment| -> Box<dyn Action> {
                Box::new(factory(next, env))
            }),
        }
    }

    /// Creates a spec that runs `f` and then continues the chain.
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Environment) -> MachinaResult<()> + Send + Sync + 'static,
    {
        let f: Arc<dyn Fn(&mut Environment) -> MachinaResult<()> + Send + Sync> = Arc::new(f);
        Self::new(name, move |next, _env| FnStep {
            next,
            f: f.clone(),
        })
    }

    /// Creates a spec that continues into an already compiled chain.
    pub fn forward(target: Next) -> Self {
        Self::new(FORWARD_STEP_NAME, move |_next, _env| Forward {
            target: target.clone(),
        })
    }

    /// The name of the step.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instantiates the step and wraps it in a link.
    pub(crate) fn link(&self, next: Next, env: &Environment) -> Next {
        let step = (self.factory)(next.clone(), env);
        Next::new(Link {
            name: self.name.clone(),
            step,
            next,
            entered: AtomicBool::new(false),
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Action for Link {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        if env.is_interrupted() {
            return Err(MachinaError::Interrupted);
        }

        self.entered.store(true, Ordering::SeqCst);
        tracing::debug!("calling in: {}", self.name);
        self.step.call(env).await?;
        tracing::debug!("calling out: {}", self.name);

        if env.is_interrupted() {
            return Err(MachinaError::Interrupted);
        }

        Ok(())
    }

    async fn recover(&self, env: &mut Environment) {
        if !self.entered.swap(false, Ordering::SeqCst) {
            return;
        }

        self.next.recover(env).await;
        tracing::debug!("recovering: {}", self.name);
        self.step.recover(env).await;
    }
}

#[async_trait]
impl Action for Terminal {
    async fn call(&self, _env: &mut Environment) -> MachinaResult<()> {
        Ok(())
    }
}

#[async_trait]
impl Action for FnStep {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        (self.f)(env)?;
        self.next.call(env).await
    }
}

#[async_trait]
impl Action for Forward {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        self.target.call(env).await
    }

    async fn recover(&self, env: &mut Environment) {
        self.target.recover(env).await
    }
}

impl fmt::Debug for StepSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StepSpec").field(&self.name).finish()
    }
}
