use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use crate::{config::ProvisionerEntry, MachinaResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Configures a running machine, e.g. by running a shell script in it.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Provisions the machine.
    async fn provision(&self) -> MachinaResult<()>;

    /// Undoes whatever the provisioner left outside of the machine. Defaults to nothing.
    async fn cleanup(&self) -> MachinaResult<()> {
        Ok(())
    }
}

/// Creates a provisioner for a configuration entry.
pub type ProvisionerFactory =
    Arc<dyn Fn(&ProvisionerEntry) -> Arc<dyn Provisioner> + Send + Sync>;

/// Provisioner implementations keyed by provisioner type.
#[derive(Clone, Default)]
pub struct ProvisionerRegistry {
    factories: HashMap<String, ProvisionerFactory>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ProvisionerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the factory for a provisioner type.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ProvisionerEntry) -> Arc<dyn Provisioner> + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Arc::new(factory));
        self
    }

    /// Creates the provisioner for `entry`, or `None` if its type is unknown.
    pub fn instantiate(&self, entry: &ProvisionerEntry) -> Option<Arc<dyn Provisioner>> {
        self.factories
            .get(entry.get_kind())
            .map(|factory| factory(entry))
    }
}
