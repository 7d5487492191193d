use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::MachinaResult;

use super::Environment;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A value given either up front or produced from the environment when a step runs.
pub enum Deferred<T> {
    /// A fixed value
    Value(T),

    /// A producer evaluated against the environment
    Lazy(Arc<dyn Fn(&Environment) -> MachinaResult<T> + Send + Sync>),
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl<T: Clone> Deferred<T> {
    /// Creates a producer evaluated against the environment.
    pub fn lazy(producer: impl Fn(&Environment) -> MachinaResult<T> + Send + Sync + 'static) -> Self {
        Self::Lazy(Arc::new(producer))
    }

    /// Returns the value, evaluating the producer if needed.
    pub fn resolve(&self, env: &Environment) -> MachinaResult<T> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Lazy(producer) => producer(env),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl<T: Clone> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Value(value) => Self::Value(value.clone()),
            Self::Lazy(producer) => Self::Lazy(producer.clone()),
        }
    }
}

impl<T> From<T> for Deferred<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Deferred<PathBuf> {
    fn from(path: &str) -> Self {
        Self::Value(PathBuf::from(path))
    }
}

impl From<&Path> for Deferred<PathBuf> {
    fn from(path: &Path) -> Self {
        Self::Value(path.to_path_buf())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
