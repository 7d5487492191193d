use std::path::PathBuf;

use async_trait::async_trait;
use machina_utils::{env::get_machina_locks_path, MachinaUtilsError, PathLock, LOCK_FILE_EXTENSION};

use crate::{
    action::{keys, Action, Deferred, Environment, Next, StepSpec},
    MachinaError, MachinaResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Runs the rest of the chain while holding an exclusive file lock.
///
/// Contention fails immediately with the configured error instead of waiting. While the lock is
/// held, a marker in the environment lets nested lock steps for the same path pass through, so
/// a run never contends with itself.
pub struct Lock {
    next: Next,
    path: Deferred<PathBuf>,
    exception: Option<Deferred<MachinaError>>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Lock {
    /// The step name.
    pub const NAME: &'static str = "lock";

    /// Locks `path`, failing with [`MachinaError::LockContended`] on contention.
    pub fn spec(path: impl Into<Deferred<PathBuf>>) -> StepSpec {
        Self::build_spec(path.into(), None)
    }

    /// Locks `path`, failing with `exception` on contention.
    pub fn spec_with_exception(
        path: impl Into<Deferred<PathBuf>>,
        exception: impl Into<Deferred<MachinaError>>,
    ) -> StepSpec {
        Self::build_spec(path.into(), Some(exception.into()))
    }

    /// Locks the action lock file in the machine's data directory.
    pub fn machine() -> StepSpec {
        Self::spec(Deferred::lazy(|env: &Environment| Ok(env.machine()?.lock_path())))
    }

    /// Locks a named lock file under the machina home directory.
    pub fn named(name: impl Into<String>) -> StepSpec {
        let name = name.into();
        Self::spec(Deferred::lazy(move |_env: &Environment| {
            Ok(get_machina_locks_path().join(format!("{}.{}", name, LOCK_FILE_EXTENSION)))
        }))
    }

    fn build_spec(path: Deferred<PathBuf>, exception: Option<Deferred<MachinaError>>) -> StepSpec {
        StepSpec::new(Self::NAME, move |next, _env| Lock {
            next,
            path: path.clone(),
            exception: exception.clone(),
        })
    }

    fn contention_error(&self, env: &Environment, path: PathBuf) -> MachinaResult<MachinaError> {
        match &self.exception {
            Some(exception) => exception.resolve(env),
            None => Ok(MachinaError::LockContended(path)),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Action for Lock {
    async fn call(&self, env: &mut Environment) -> MachinaResult<()> {
        let path = self.path.resolve(env)?;
        let marker = format!("{}{}", keys::LOCK_MARKER_PREFIX, path.display());

        if env.is_truthy(&marker) {
            tracing::debug!("lock already held by this run: {}", path.display());
            return self.next.call(env).await;
        }

        tracing::info!("locking: {}", path.display());
        let lock = match PathLock::try_acquire(&path) {
            Ok(lock) => lock,
            Err(MachinaUtilsError::LockContended(path)) => {
                tracing::info!("lock is held elsewhere: {}", path.display());
                return Err(self.contention_error(env, path)?);
            }
            Err(e) => return Err(e.into()),
        };

        env.insert(marker.clone(), true);
        let result = self.next.call(env).await;
        env.remove(&marker);

        tracing::info!("unlocking: {}", path.display());
        drop(lock);

        result
    }
}
