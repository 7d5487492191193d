//! Non-blocking exclusive file locks.
//!
//! A [`PathLock`] wraps an OS-level advisory lock on a file. Advisory record locks are owned by
//! the process, so two threads of the same process would never contend on them. To make
//! contention visible between threads too, every held path is also tracked in a process-wide
//! registry that is consulted before the OS lock is taken.

use std::{
    collections::HashSet,
    fs::OpenOptions,
    io,
    path::{Path, PathBuf},
    sync::{LazyLock, Mutex, MutexGuard, PoisonError},
};

use file_lock::{FileLock, FileOptions};

use crate::{MachinaUtilsError, MachinaUtilsResult};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Paths currently locked by this process.
static HELD_PATHS: LazyLock<Mutex<HashSet<PathBuf>>> = LazyLock::new(|| Mutex::new(HashSet::new()));

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// An exclusive lock on a file path.
///
/// The lock is released when the value is dropped.
pub struct PathLock {
    /// The path as passed by the caller
    path: PathBuf,

    /// The key under which the path is tracked in the process registry
    key: PathBuf,

    /// The OS-level lock
    file_lock: Option<FileLock>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl PathLock {
    /// Tries to take an exclusive lock on `path` without blocking.
    ///
    /// The file and its parent directories are created if missing. The content of the file is
    /// never touched.
    ///
    /// ## Arguments
    /// * `path` - The lock file
    ///
    /// ## Errors
    /// Returns [`MachinaUtilsError::LockContended`] if the lock is held by this or any other
    /// process, and [`MachinaUtilsError::IoError`] if the file cannot be opened.
    ///
    /// ## Example
    /// ```no_run
    /// use machina_utils::PathLock;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let lock = PathLock::try_acquire("/tmp/machina/action.lock")?;
    /// // critical section
    /// drop(lock);
    /// # Ok(())
    /// # }
    /// ```
    pub fn try_acquire(path: impl AsRef<Path>) -> MachinaUtilsResult<Self> {
        let path = path.as_ref().to_path_buf();
        let key = registry_key(&path)?;

        if !held_paths().insert(key.clone()) {
            return Err(MachinaUtilsError::LockContended(path));
        }

        // Give the registry entry back if the OS lock is not taken
        let registered = scopeguard::guard(key, |key| {
            held_paths().remove(&key);
        });

        // Nothing else in this process holds the lock, so opening and closing the file here cannot
        // drop an existing record lock. It surfaces real open errors separately from contention.
        OpenOptions::new().write(true).create(true).open(&path)?;

        let options = FileOptions::new().write(true).create(true);
        match FileLock::lock(&path, false, options) {
            Ok(file_lock) => {
                tracing::debug!("acquired lock: {}", path.display());
                Ok(Self {
                    path,
                    key: scopeguard::ScopeGuard::into_inner(registered),
                    file_lock: Some(file_lock),
                })
            }
            Err(e) if is_contention(&e) => Err(MachinaUtilsError::LockContended(path)),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns the locked path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Drop for PathLock {
    fn drop(&mut self) {
        if let Some(file_lock) = self.file_lock.take() {
            if let Err(e) = file_lock.unlock() {
                tracing::warn!("failed to unlock {}: {}", self.path.display(), e);
            }
        }

        held_paths().remove(&self.key);
        tracing::debug!("released lock: {}", self.path.display());
    }
}

impl std::fmt::Debug for PathLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathLock").field("path", &self.path).finish()
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn held_paths() -> MutexGuard<'static, HashSet<PathBuf>> {
    HELD_PATHS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Resolves the parent directory so that different spellings of one path share a key.
fn registry_key(path: &Path) -> io::Result<PathBuf> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    std::fs::create_dir_all(&parent)?;

    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("lock path has no file name: {}", path.display()),
        )
    })?;

    Ok(std::fs::canonicalize(parent)?.join(file_name))
}

fn is_contention(error: &io::Error) -> bool {
    matches!(error.kind(), io::ErrorKind::WouldBlock)
        || matches!(error.raw_os_error(), Some(code) if code == libc::EAGAIN || code == libc::EACCES)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
