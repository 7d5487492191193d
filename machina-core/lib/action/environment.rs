//! The environment threaded through every step of a run.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    machine::{BoxCollection, Machine},
    ui::{SilentUi, Ui},
    MachinaError, MachinaResult,
};

use super::{HookDispatcher, Runner};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Well-known keys of the environment's extra map.
pub mod keys {
    /// Whether provisioning is enabled for this run
    pub const PROVISION_ENABLED: &str = "provision_enabled";

    /// Whether to ignore the provisioning sentinel
    pub const PROVISION_IGNORE_SENTINEL: &str = "provision_ignore_sentinel";

    /// Provisioner names or types to restrict provisioning to
    pub const PROVISION_TYPES: &str = "provision_types";

    /// Skips the destroy confirmation
    pub const FORCE_CONFIRM_DESTROY: &str = "force_confirm_destroy";

    /// The provisioner type of the current provisioner run
    pub const PROVISIONER_NAME: &str = "provisioner_name";

    /// The project root that relative synced folder paths are resolved against
    pub const ROOT_PATH: &str = "root_path";

    /// Prefix of the marker set while a lock is held
    pub const LOCK_MARKER_PREFIX: &str = "has_lock_";
}

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A cooperative cancellation flag shared by an environment and all of its clones.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

/// The shared context of one pipeline run.
///
/// Well-known collaborators live in typed fields. Anything else goes into the extra map, keyed by
/// string. Cloning gives an isolated copy of the data that still shares the interrupt flag, which
/// is what nested runs need.
#[derive(Clone, Default)]
pub struct Environment {
    /// The machine the action operates on
    pub machine: Option<Arc<Machine>>,

    /// The output sink
    pub ui: Option<Arc<dyn Ui>>,

    /// The local box store
    pub box_collection: Option<Arc<dyn BoxCollection>>,

    /// The result of the last predicate step
    pub result: Option<bool>,

    /// The error that aborted the run, set for the recovery pass
    pub error: Option<MachinaError>,

    /// Dispatches named hooks
    pub hook: Option<Arc<dyn HookDispatcher>>,

    /// The runner executing this environment
    pub action_runner: Option<Runner>,

    /// The name of the running action
    pub action_name: Option<String>,

    interrupted: InterruptFlag,
    extras: HashMap<String, Value>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl InterruptFlag {
    /// Requests cancellation.
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true if cancellation was requested.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Environment {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the machine.
    pub fn with_machine(mut self, machine: Arc<Machine>) -> Self {
        self.machine = Some(machine);
        self
    }

    /// Sets the UI.
    pub fn with_ui(mut self, ui: Arc<dyn Ui>) -> Self {
        self.ui = Some(ui);
        self
    }

    /// Sets the box collection.
    pub fn with_box_collection(mut self, box_collection: Arc<dyn BoxCollection>) -> Self {
        self.box_collection = Some(box_collection);
        self
    }

    /// Sets the action name.
    pub fn with_action_name(mut self, name: impl Into<String>) -> Self {
        self.action_name = Some(name.into());
        self
    }

    /// Sets an extra key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the machine, failing if there is none.
    pub fn machine(&self) -> MachinaResult<Arc<Machine>> {
        self.machine
            .clone()
            .ok_or(MachinaError::MissingEnvironment("machine"))
    }

    /// Returns the UI, or a silent one.
    pub fn ui(&self) -> Arc<dyn Ui> {
        self.ui.clone().unwrap_or_else(|| Arc::new(SilentUi))
    }

    /// Returns the runner, or a default one.
    pub fn runner(&self) -> Runner {
        self.action_runner.clone().unwrap_or_default()
    }

    /// Returns the interrupt flag.
    pub fn interrupt_flag(&self) -> &InterruptFlag {
        &self.interrupted
    }

    /// Returns true if cancellation was requested.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.is_set()
    }

    /// Returns an extra value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extras.get(key)
    }

    /// Returns an extra value converted to `T`, or `None` if it is missing or has another shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.extras
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Returns true if the extra key is set, even to `null` or `false`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.extras.contains_key(key)
    }

    /// Returns true if the key is set to something other than `null` or `false`.
    pub fn is_truthy(&self, key: &str) -> bool {
        !matches!(self.extras.get(key), None | Some(Value::Null) | Some(Value::Bool(false)))
    }

    /// Sets an extra key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extras.insert(key.into(), value.into());
    }

    /// Removes an extra key.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.extras.remove(key)
    }

    /// Returns the extra keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.extras.keys().map(String::as_str)
    }

    /// Sets many extra keys at once.
    pub fn extend<K, V>(&mut self, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in entries {
            self.insert(key, value);
        }
    }

    /// Copies everything set in `other` into `self`, overwriting what is there.
    pub fn merge(&mut self, other: Environment) {
        let Environment {
            machine,
            ui,
            box_collection,
            result,
            error,
            hook,
            action_runner,
            action_name,
            interrupted: _,
            extras,
        } = other;

        overwrite(&mut self.machine, machine);
        overwrite(&mut self.ui, ui);
        overwrite(&mut self.box_collection, box_collection);
        overwrite(&mut self.result, result);
        overwrite(&mut self.error, error);
        overwrite(&mut self.hook, hook);
        overwrite(&mut self.action_runner, action_runner);
        overwrite(&mut self.action_name, action_name);
        self.extras.extend(extras);
    }

    /// Fills in what is missing from `defaults`, never overwriting anything already set.
    pub fn merge_defaults(&mut self, defaults: &Environment) {
        fill(&mut self.machine, &defaults.machine);
        fill(&mut self.ui, &defaults.ui);
        fill(&mut self.box_collection, &defaults.box_collection);
        fill(&mut self.result, &defaults.result);
        fill(&mut self.error, &defaults.error);
        fill(&mut self.hook, &defaults.hook);
        fill(&mut self.action_runner, &defaults.action_runner);
        fill(&mut self.action_name, &defaults.action_name);

        for (key, value) in &defaults.extras {
            self.extras
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("machine", &self.machine)
            .field("result", &self.result)
            .field("error", &self.error)
            .field("action_name", &self.action_name)
            .field("interrupted", &self.is_interrupted())
            .field("extras", &self.extras)
            .finish_non_exhaustive()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn overwrite<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(value);
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
