//! A registry of per-key async mutexes.

use std::{
    collections::HashMap,
    hash::Hash,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Hands out one async mutex per key, creating it on first use.
///
/// The map itself is guarded by a coarse lock that is only held while looking up or inserting an
/// entry. The critical section for a key is guarded by that key's own mutex, so work on different
/// keys never serializes.
pub struct KeyedMutex<K> {
    entries: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl<K> KeyedMutex<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the mutex for `key`, creating it if this is the first request for that key.
    pub fn get(&self, key: &K) -> Arc<AsyncMutex<()>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Waits for exclusive access to `key`.
    ///
    /// ## Example
    /// ```no_run
    /// use machina_utils::KeyedMutex;
    ///
    /// # async fn example() -> anyhow::Result<()> {
    /// let boxes = KeyedMutex::new();
    /// let _guard = boxes.lock(&"ubuntu/jammy64".to_string()).await;
    /// // only one task at a time gets here for this box name
    /// # Ok(())
    /// # }
    /// ```
    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<()> {
        self.get(key).lock_owned().await
    }

    /// Returns the number of keys seen so far.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no key was requested yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl<K> Default for KeyedMutex<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
