//! Advisory locking of the master file while it is mapped.
//!
//! Cross-platform (fs2) shared lock on the file itself: many readers may
//! hold it at once, a writer taking an exclusive lock is kept out until
//! every reader is done. Lock is released on Drop, on every exit path.

// Методы fs2 вызываются через FileExt::..: у std::fs::File есть одноимённые
// lock_shared/try_lock_shared с другим типом ошибки.
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{MstError, Result};

pub struct SharedLockGuard {
    file: File,
    path: PathBuf,
}

impl SharedLockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SharedLockGuard {
    fn drop(&mut self) {
        // ошибки unlock на drop игнорируем
        let _ = FileExt::unlock(&self.file);
    }
}

/// Acquire a shared lock on `file`. Blocks until acquired.
pub fn acquire_shared_lock(file: &File, path: &Path) -> Result<SharedLockGuard> {
    let handle = file.try_clone().map_err(|e| MstError::io(path, e))?;
    FileExt::lock_shared(&handle).map_err(|e| MstError::io(path, e))?;
    Ok(SharedLockGuard {
        file: handle,
        path: path.to_path_buf(),
    })
}

/// Non-blocking variant; Err if an exclusive lock is held elsewhere.
pub fn try_acquire_shared_lock(file: &File, path: &Path) -> Result<SharedLockGuard> {
    let handle = file.try_clone().map_err(|e| MstError::io(path, e))?;
    FileExt::try_lock_shared(&handle).map_err(|e| MstError::io(path, e))?;
    Ok(SharedLockGuard {
        file: handle,
        path: path.to_path_buf(),
    })
}
