use std::path::PathBuf;

use getset::{Getters, Setters};
use serde::Deserialize;
use typed_builder::TypedBuilder;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A folder shared between the host and the machine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, TypedBuilder, Getters, Setters)]
#[getset(get = "pub with_prefix")]
pub struct SyncedFolder {
    /// The directory on the host, relative paths are resolved against the project root
    #[builder(setter(into))]
    #[getset(set = "pub")]
    host_path: PathBuf,

    /// The mount point inside the machine
    #[builder(setter(into))]
    guest_path: String,

    /// The synced folder implementation to use. The best usable one is picked when unset.
    #[serde(rename = "type", default)]
    #[builder(default, setter(strip_option, into))]
    kind: Option<String>,

    /// Disabled folders are skipped
    #[serde(default)]
    #[builder(default)]
    disabled: bool,

    /// Whether to create the host directory if it is missing
    #[serde(default)]
    #[builder(default)]
    create: bool,
}
