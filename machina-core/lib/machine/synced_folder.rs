use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;

use crate::{config::SyncedFolder, MachinaResult};

use super::Machine;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Synced folders handled by one implementation, keyed by folder id.
pub type SyncedFolderSet = BTreeMap<String, SyncedFolder>;

/// A way of sharing folders with the machine, e.g. NFS or rsync.
#[async_trait]
pub trait SyncedFolderImpl: Send + Sync {
    /// Returns true if this implementation works for the machine.
    fn usable(&self, machine: &Machine) -> bool;

    /// Prepares the folders before the machine boots.
    async fn prepare(&self, _machine: &Machine, _folders: &SyncedFolderSet) -> MachinaResult<()> {
        Ok(())
    }

    /// Makes the folders available once the machine is up.
    async fn enable(&self, machine: &Machine, folders: &SyncedFolderSet) -> MachinaResult<()>;
}

/// Synced folder implementations keyed by type, each with a priority.
#[derive(Clone, Default)]
pub struct SyncedFolderRegistry {
    entries: BTreeMap<String, (Arc<dyn SyncedFolderImpl>, i32)>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl SyncedFolderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an implementation. Higher priorities are preferred when no type is requested.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        implementation: Arc<dyn SyncedFolderImpl>,
        priority: i32,
    ) -> &mut Self {
        self.entries.insert(kind.into(), (implementation, priority));
        self
    }

    /// Returns the implementation registered for `kind`.
    pub fn get(&self, kind: &str) -> Option<Arc<dyn SyncedFolderImpl>> {
        self.entries.get(kind).map(|(implementation, _)| implementation.clone())
    }

    /// Returns the highest priority implementation that is usable for the machine.
    pub fn default_for(&self, machine: &Machine) -> Option<(String, Arc<dyn SyncedFolderImpl>)> {
        let mut ordered: Vec<_> = self.entries.iter().collect();
        ordered.sort_by(|(_, (_, a)), (_, (_, b))| b.cmp(a));

        ordered
            .into_iter()
            .find(|(_, (implementation, _))| implementation.usable(machine))
            .map(|(kind, (implementation, _))| (kind.clone(), implementation.clone()))
    }

    /// Returns all registered type names, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }
}
