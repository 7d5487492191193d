use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;

use crate::{
    action::{keys, Action, Environment, Next, StepSpec},
    machine::{Machine, SyncedFolderImpl, SyncedFolderSet},
    MachinaError, MachinaResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Enabled synced folders grouped by the implementation that handles them.
type FolderGroups = BTreeMap<String, (Arc<dyn SyncedFolderImpl>, SyncedFolderSet)>;

/// Sets up the machine's synced folders.
///
/// Folders are prepared before the rest of the chain runs, which is usually before boot, and
/// enabled after it. Relative host paths are resolved against the `root_path` environment key,
/// or the current directory without one.
pub struct SyncedFolders {
    next: Next,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl SyncedFolders {
    /// The step name.
    pub const NAME: &'static str = "synced_folders";

    /// Creates the step spec.
    pub fn spec() -> StepSpec {
        StepSpec::new(Self::NAME, |next, _env| SyncedFolders { next })
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Action for SyncedFolders {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        let machine = env.machine()?;
        let root = match env.get_as::<PathBuf>(keys::ROOT_PATH) {
            Some(root) => root,
            None => std::env::current_dir()?,
        };

        let mut groups = group_folders(&machine)?;
        for (_, folders) in groups.values_mut() {
            for folder in folders.values_mut() {
                let host_path = resolve_host_path(&root, folder.get_host_path(), *folder.get_create())?;
                folder.set_host_path(host_path);
            }
        }

        for (kind, (implementation, folders)) in &groups {
            tracing::info!("preparing {} synced folders of type: {}", folders.len(), kind);
            implementation.prepare(&machine, folders).await?;
        }

        self.next.call(env).await?;

        let ui = env.ui();
        for (kind, (implementation, folders)) in &groups {
            for folder in folders.values() {
                ui.detail(&format!(
                    "{} => {} ({})",
                    folder.get_guest_path(),
                    folder.get_host_path().display(),
                    kind
                ));
            }

            implementation.enable(&machine, folders).await?;
        }

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn group_folders(machine: &Machine) -> MachinaResult<FolderGroups> {
    let registry = machine.get_synced_folder_plugins();
    let mut default = None;
    let mut groups = FolderGroups::new();

    for (id, folder) in machine.get_config().get_synced_folders() {
        if *folder.get_disabled() {
            continue;
        }

        let (kind, implementation) = match folder.get_kind() {
            Some(kind) => {
                let implementation = registry
                    .get(kind)
                    .ok_or_else(|| MachinaError::UnknownSyncedFolderType(kind.clone()))?;
                (kind.clone(), implementation)
            }
            None => {
                if default.is_none() {
                    default = Some(registry.default_for(machine).ok_or_else(|| {
                        MachinaError::NoDefaultSyncedFolderImpl(registry.kinds().join(", "))
                    })?);
                }

                match &default {
                    Some((kind, implementation)) => (kind.clone(), implementation.clone()),
                    None => continue,
                }
            }
        };

        groups
            .entry(kind)
            .or_insert_with(|| (implementation, SyncedFolderSet::new()))
            .1
            .insert(id.clone(), folder.clone());
    }

    Ok(groups)
}

/// Resolves a host path against the root, creating the directory if asked to.
fn resolve_host_path(root: &Path, host_path: &Path, create: bool) -> MachinaResult<PathBuf> {
    let path = root.join(host_path);

    if !path.exists() {
        if !create {
            return Ok(path);
        }

        tracing::info!("creating synced folder host directory: {}", path.display());
        if let Err(e) = std::fs::create_dir_all(&path) {
            return Err(match e.kind() {
                io::ErrorKind::PermissionDenied => MachinaError::SyncedFolderCreateFailed(path),
                _ => e.into(),
            });
        }
    }

    Ok(path.canonicalize()?)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
