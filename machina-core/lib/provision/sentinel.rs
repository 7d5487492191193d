//! The provisioning sentinel.
//!
//! After a machine was provisioned, a small file in its data directory records the machine id
//! it was provisioned for, as `<version>:<id>`. Later runs skip provisioning while the file still
//! names the current machine. Files written by older versions hold a single token and are
//! upgraded to the current format.

use std::path::Path;

use crate::{config::PROVISION_SENTINEL_VERSION, MachinaResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// What a sentinel file says about the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentinelState {
    /// There is no sentinel file.
    Missing,

    /// The file uses the old single token format.
    Legacy,

    /// The file was written for this machine by the current format.
    Current,

    /// The file was written for another machine or by an unknown format.
    Foreign,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Classifies sentinel file contents for the machine with the given id.
pub fn parse(contents: &str, machine_id: Option<&str>) -> SentinelState {
    match contents.trim_end().split_once(':') {
        None => SentinelState::Legacy,
        Some((version, id))
            if version == PROVISION_SENTINEL_VERSION && id == machine_id.unwrap_or_default() =>
        {
            SentinelState::Current
        }
        Some(_) => SentinelState::Foreign,
    }
}

/// Formats the sentinel contents for the machine with the given id.
pub fn format(machine_id: Option<&str>) -> String {
    format!(
        "{}:{}",
        PROVISION_SENTINEL_VERSION,
        machine_id.unwrap_or_default()
    )
}

/// Reads and classifies the sentinel file at `path`.
pub async fn read(path: &Path, machine_id: Option<&str>) -> MachinaResult<SentinelState> {
    if !tokio::fs::try_exists(path).await? {
        return Ok(SentinelState::Missing);
    }

    let contents = tokio::fs::read_to_string(path).await?;
    Ok(parse(&contents, machine_id))
}

/// Writes the sentinel file for the machine with the given id.
pub async fn write(path: &Path, machine_id: Option<&str>) -> MachinaResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    tokio::fs::write(path, format(machine_id)).await?;
    tracing::debug!("wrote provision sentinel: {}", path.display());
    Ok(())
}

/// Removes the sentinel file, if there is one.
pub async fn remove(path: &Path) -> MachinaResult<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
