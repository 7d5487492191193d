//! Assembling steps into chains.

use crate::{MachinaError, MachinaResult};

use super::{Chain, Environment, Next, StepSpec};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Identifies an entry of a builder, by position or by step name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepRef {
    /// The entry at this index
    Index(usize),

    /// The first entry with this step name
    Name(String),
}

/// Something that can be added to a builder: a single step or all steps of another builder.
#[derive(Debug, Clone)]
pub enum Middleware {
    /// A single step
    Step(StepSpec),

    /// The steps of a builder, spliced in order
    Builder(Builder),
}

/// An ordered, editable list of step specs.
///
/// Editing a builder never affects chains already compiled from it, and every compilation
/// creates fresh step instances.
///
/// ## Example
/// ```no_run
/// use machina_core::action::{builtin::EnvSet, Builder, Environment, Runner, StepSpec};
///
/// # async fn example() -> anyhow::Result<()> {
/// let mut builder = Builder::new();
/// builder
///     .use_step(EnvSet::spec([("x", 1)]))
///     .use_step(StepSpec::from_fn("set_y", |env| {
///         env.insert("y", 2);
///         Ok(())
///     }));
///
/// let env = Runner::new().run(builder, Environment::new()).await?;
/// assert!(env.contains_key("y"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    stack: Vec<StepSpec>,
    primary: bool,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Builder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty primary builder. Registered hooks are only applied to primary builders.
    pub fn new_primary() -> Self {
        Self {
            stack: Vec::new(),
            primary: true,
        }
    }

    /// Creates a builder holding the given middleware.
    pub fn build(middleware: impl Into<Middleware>) -> Self {
        let mut builder = Self::new();
        builder.use_step(middleware);
        builder
    }

    /// Returns true if registered hooks apply to this builder.
    pub fn is_primary(&self) -> bool {
        self.primary
    }

    /// Marks the builder as primary or not.
    pub fn set_primary(&mut self, primary: bool) -> &mut Self {
        self.primary = primary;
        self
    }

    /// Appends middleware to the end.
    pub fn use_step(&mut self, middleware: impl Into<Middleware>) -> &mut Self {
        self.stack.extend(middleware.into().into_specs());
        self
    }

    /// Appends all steps of another builder.
    pub fn append(&mut self, other: &Builder) -> &mut Self {
        self.stack.extend(other.stack.iter().cloned());
        self
    }

    /// Inserts middleware at the position of `at`, moving that entry back.
    ///
    /// An index equal to the length appends.
    pub fn insert(
        &mut self,
        at: impl Into<StepRef>,
        middleware: impl Into<Middleware>,
    ) -> MachinaResult<&mut Self> {
        let at = at.into();
        let index = match &at {
            StepRef::Index(index) if *index <= self.stack.len() => *index,
            _ => self.require(&at)?,
        };

        self.splice(index, 0, middleware);
        Ok(self)
    }

    /// Same as [`Builder::insert`].
    pub fn insert_before(
        &mut self,
        at: impl Into<StepRef>,
        middleware: impl Into<Middleware>,
    ) -> MachinaResult<&mut Self> {
        self.insert(at, middleware)
    }

    /// Inserts middleware right after the entry `at`.
    pub fn insert_after(
        &mut self,
        at: impl Into<StepRef>,
        middleware: impl Into<Middleware>,
    ) -> MachinaResult<&mut Self> {
        let index = self.require(&at.into())?;
        self.splice(index + 1, 0, middleware);
        Ok(self)
    }

    /// Replaces the entry `at`, keeping its position.
    pub fn replace(
        &mut self,
        at: impl Into<StepRef>,
        middleware: impl Into<Middleware>,
    ) -> MachinaResult<&mut Self> {
        let index = self.require(&at.into())?;
        self.splice(index, 1, middleware);
        Ok(self)
    }

    /// Removes the entry `at`.
    pub fn delete(&mut self, at: impl Into<StepRef>) -> MachinaResult<&mut Self> {
        let index = self.require(&at.into())?;
        self.stack.remove(index);
        Ok(self)
    }

    /// Returns the position of an entry, if it exists.
    pub fn index(&self, at: impl Into<StepRef>) -> Option<usize> {
        match at.into() {
            StepRef::Index(index) => (index < self.stack.len()).then_some(index),
            StepRef::Name(name) => self.stack.iter().position(|spec| spec.name() == name),
        }
    }

    /// Returns the step names in order.
    pub fn names(&self) -> Vec<&str> {
        self.stack.iter().map(StepSpec::name).collect()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Compiles the entries into a chain.
    ///
    /// Steps are instantiated from last to first, each wrapping the one after it, and the last
    /// one wrapping a no-op terminal.
    pub fn to_app(&self, env: &Environment) -> Chain {
        let head = self
            .stack
            .iter()
            .rev()
            .fold(Next::terminal(), |next, spec| spec.link(next, env));

        Chain::new(head)
    }

    fn require(&self, at: &StepRef) -> MachinaResult<usize> {
        self.index(at.clone())
            .ok_or_else(|| MachinaError::StepNotFound(at.to_string()))
    }

    fn splice(&mut self, index: usize, remove: usize, middleware: impl Into<Middleware>) {
        let specs = middleware.into().into_specs();
        self.stack.splice(index..index + remove, specs);
    }
}

impl Middleware {
    /// Flattens the middleware into step specs.
    pub fn into_specs(self) -> Vec<StepSpec> {
        match self {
            Self::Step(spec) => vec![spec],
            Self::Builder(builder) => builder.stack,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl From<StepSpec> for Middleware {
    fn from(spec: StepSpec) -> Self {
        Self::Step(spec)
    }
}

impl From<Builder> for Middleware {
    fn from(builder: Builder) -> Self {
        Self::Builder(builder)
    }
}

impl From<usize> for StepRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for StepRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for StepRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl std::fmt::Display for StepRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(index) => write!(f, "index {}", index),
            Self::Name(name) => f.write_str(name),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
