use std::sync::LazyLock;

use async_trait::async_trait;
use machina_utils::KeyedMutex;

use crate::{
    action::{Action, Environment, Next, StepSpec},
    machine::{BoxAddRequest, BoxSource},
    MachinaError, MachinaResult,
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Serializes box additions per box name across all runs in this process.
static BOX_LOCKS: LazyLock<KeyedMutex<String>> = LazyLock::new(KeyedMutex::new);

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Makes sure the configured box is in the box collection, adding it if needed.
///
/// The box comes from the configured URL if there is one, otherwise from the catalog. Only one
/// task adds a given box at a time. A box that appears while waiting, or that another process
/// adds concurrently, is not an error.
pub struct HandleBox {
    next: Next,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl HandleBox {
    /// The step name.
    pub const NAME: &'static str = "handle_box";

    /// Creates the step spec.
    pub fn spec() -> StepSpec {
        StepSpec::new(Self::NAME, |next, _env| HandleBox { next })
    }

    async fn ensure_box(&self, env: &Environment, box_name: &str) -> MachinaResult<()> {
        let machine = env.machine()?;
        let config = machine.get_config();
        let boxes = env
            .box_collection
            .clone()
            .ok_or(MachinaError::MissingEnvironment("box collection"))?;

        let _guard = BOX_LOCKS.lock(&box_name.to_string()).await;

        let provider = config.get_provider();
        let version = config.get_box_version().as_deref();
        if boxes.find(box_name, provider, version).await?.is_some() {
            tracing::debug!("box already present: {}", box_name);
            return Ok(());
        }

        let ui = env.ui();
        ui.output(&format!(
            "box '{}' could not be found, attempting to add it...",
            box_name
        ));

        let source = match config.get_box_url() {
            Some(url) => BoxSource::Url(url.clone()),
            None => BoxSource::Catalog,
        };

        let request = BoxAddRequest {
            name: box_name.to_string(),
            provider: provider.clone(),
            version: version.map(String::from),
            source,
        };

        match boxes.add(request).await {
            Ok(info) => {
                ui.success(&format!(
                    "added box '{}' ({}, {})",
                    info.name, info.provider, info.version
                ));
                Ok(())
            }
            Err(MachinaError::BoxAlreadyExists(name)) => {
                tracing::info!("box was added concurrently: {}", name);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Action for HandleBox {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        let machine = env.machine()?;
        match machine.get_config().get_box_name() {
            Some(box_name) => self.ensure_box(env, box_name).await?,
            None => tracing::debug!("no box configured, skipping box handling"),
        }

        self.next.call(env).await
    }
}
