//! Hooks let plugins add steps to builders they did not create.
//!
//! A [`Hook`] collects steps to place at the start or end of a builder, or right before or after
//! a named step. Callbacks registered in a [`HookRegistry`] fill in a hook for a given name. The
//! runner applies them to primary builders: callbacks registered under the action name affect
//! the whole builder, callbacks registered under a step name are applied relative to that step.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use crate::MachinaResult;

use super::{Builder, Environment, Middleware, StepSpec};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Steps to add around an existing builder.
#[derive(Debug, Clone, Default)]
pub struct Hook {
    before: Vec<(String, Vec<StepSpec>)>,
    after: Vec<(String, Vec<StepSpec>)>,
    prepend: Vec<StepSpec>,
    append: Vec<StepSpec>,
}

/// Fills in a hook.
pub type HookCallback = Arc<dyn Fn(&mut Hook) + Send + Sync>;

/// Hook callbacks keyed by action or step name.
#[derive(Clone, Default)]
pub struct HookRegistry {
    callbacks: HashMap<String, Vec<HookCallback>>,
}

/// Runs named extension points so that plugins can wrap them.
#[async_trait]
pub trait HookDispatcher: Send + Sync {
    /// Runs `callable` as the action `name` and returns the resulting environment.
    ///
    /// Hooks registered under `name` are applied to the callable, so an empty callable still runs
    /// whatever the plugins added.
    async fn call(
        &self,
        name: &str,
        env: Environment,
        callable: Option<Builder>,
    ) -> MachinaResult<Environment>;
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Hook {
    /// Creates an empty hook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds middleware right before the builder entry named `existing`.
    pub fn before(&mut self, existing: impl Into<String>, middleware: impl Into<Middleware>) {
        push_keyed(&mut self.before, existing.into(), middleware);
    }

    /// Adds middleware right after the builder entry named `existing`.
    pub fn after(&mut self, existing: impl Into<String>, middleware: impl Into<Middleware>) {
        push_keyed(&mut self.after, existing.into(), middleware);
    }

    /// Adds middleware to the start, or right before the root step when applied with one.
    pub fn prepend(&mut self, middleware: impl Into<Middleware>) {
        self.prepend.extend(middleware.into().into_specs());
    }

    /// Adds middleware to the end, or right after the root step when applied with one.
    ///
    /// Appended steps do not run if an earlier step stops the chain.
    pub fn append(&mut self, middleware: impl Into<Middleware>) {
        self.append.extend(middleware.into().into_specs());
    }

    /// Returns true if nothing was added.
    pub fn is_empty(&self) -> bool {
        self.before.is_empty()
            && self.after.is_empty()
            && self.prepend.is_empty()
            && self.append.is_empty()
    }

    /// Applies the hook to a builder.
    ///
    /// With a `root`, prepended and appended steps go right before and after that step, and
    /// nothing is added if the root is missing. Before and after steps for names not present in
    /// the builder are skipped. Steps added for one position keep the order they were added in.
    pub fn apply(&self, builder: &mut Builder, root: Option<&str>) -> MachinaResult<()> {
        let root_index = match root {
            Some(root) => match builder.index(root) {
                Some(index) => Some(index),
                None => return Ok(()),
            },
            None => None,
        };

        let start = root_index.unwrap_or(0);
        for (offset, spec) in self.prepend.iter().enumerate() {
            builder.insert(start + offset, spec.clone())?;
        }

        match root_index {
            Some(index) => {
                let after_root = index + self.prepend.len() + 1;
                for (offset, spec) in self.append.iter().enumerate() {
                    builder.insert(after_root + offset, spec.clone())?;
                }
            }
            None => {
                for spec in &self.append {
                    builder.use_step(spec.clone());
                }
            }
        }

        for (existing, specs) in &self.before {
            if builder.index(existing.as_str()).is_none() {
                continue;
            }

            for spec in specs {
                builder.insert_before(existing.as_str(), spec.clone())?;
            }
        }

        for (existing, specs) in &self.after {
            let Some(index) = builder.index(existing.as_str()) else {
                continue;
            };

            for (offset, spec) in specs.iter().enumerate() {
                builder.insert(index + 1 + offset, spec.clone())?;
            }
        }

        Ok(())
    }
}

impl HookRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback for an action or step name.
    ///
    /// ## Example
    /// ```no_run
    /// use machina_core::action::{builtin::Message, HookRegistry};
    ///
    /// let mut hooks = HookRegistry::new();
    /// hooks.register("machine_action_up", |hook| {
    ///     hook.append(Message::spec("machine is ready"));
    /// });
    /// ```
    pub fn register<F>(&mut self, name: impl Into<String>, callback: F) -> &mut Self
    where
        F: Fn(&mut Hook) + Send + Sync + 'static,
    {
        self.callbacks
            .entry(name.into())
            .or_default()
            .push(Arc::new(callback));
        self
    }

    /// Returns true if any callback is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.callbacks.contains_key(name)
    }

    /// Builds the hook for `name` by running its callbacks in registration order.
    pub fn hook_for(&self, name: &str) -> Hook {
        let mut hook = Hook::new();
        for callback in self.callbacks.get(name).into_iter().flatten() {
            callback(&mut hook);
        }
        hook
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn push_keyed(
    entries: &mut Vec<(String, Vec<StepSpec>)>,
    key: String,
    middleware: impl Into<Middleware>,
) {
    let specs = middleware.into().into_specs();
    match entries.iter_mut().find(|(existing, _)| *existing == key) {
        Some((_, list)) => list.extend(specs),
        None => entries.push((key, specs)),
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
