use getset::Getters;
use serde::Deserialize;
use typed_builder::TypedBuilder;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// When a provisioner runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Runs the first time the machine is provisioned.
    #[default]
    Once,

    /// Runs on every provisioning pass, even if the machine was provisioned before.
    Always,

    /// Runs only when explicitly requested by name.
    Never,
}

/// The target of a `before` or `after` ordering constraint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum OrderRef {
    /// Around every provisioner without a wildcard constraint (written `:each`).
    Each,

    /// Around the whole provisioner list (written `:all`).
    All,

    /// Next to the provisioner with this name.
    Named(String),
}

/// Which side of its target a provisioner is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Placed before the target.
    Before,

    /// Placed after the target.
    After,
}

/// A provisioner entry in the machine configuration.
#[derive(Debug, Clone, Deserialize, TypedBuilder, Getters)]
#[getset(get = "pub with_prefix")]
pub struct ProvisionerEntry {
    /// The name of the provisioner, used for ordering and for selecting it explicitly
    #[serde(default)]
    #[builder(default, setter(strip_option, into))]
    name: Option<String>,

    /// The provisioner type, e.g. `shell`
    #[serde(rename = "type")]
    #[builder(setter(into))]
    kind: String,

    /// When it runs
    #[serde(default)]
    #[builder(default)]
    run: RunMode,

    /// Run before this target
    #[serde(default)]
    #[builder(default, setter(strip_option, into))]
    before: Option<OrderRef>,

    /// Run after this target
    #[serde(default)]
    #[builder(default, setter(strip_option, into))]
    after: Option<OrderRef>,

    /// Settings handed to the provisioner implementation
    #[serde(default)]
    #[builder(default)]
    config: serde_json::Value,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ProvisionerEntry {
    /// The effective ordering constraint. `before` wins when both are set.
    pub fn constraint(&self) -> Option<(Placement, &OrderRef)> {
        match (&self.before, &self.after) {
            (Some(target), _) => Some((Placement::Before, target)),
            (None, Some(target)) => Some((Placement::After, target)),
            (None, None) => None,
        }
    }

    /// The name shown to the user: `name (type)`, or just the type for unnamed provisioners.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{} ({})", name, self.kind),
            None => self.kind.clone(),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl From<String> for OrderRef {
    fn from(value: String) -> Self {
        match value.as_str() {
            ":each" => Self::Each,
            ":all" => Self::All,
            _ => Self::Named(value),
        }
    }
}

impl From<&str> for OrderRef {
    fn from(value: &str) -> Self {
        value.to_string().into()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
