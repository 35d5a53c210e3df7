use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use linker_core::{LinkError, LinkErrorKind};
use linker_logging::{linker_debug, linker_warn};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("another run is already linking {path} (lock file {lock_file})")]
    Held { path: String, lock_file: String },
    #[error("cannot create lock file {lock_file}: {source}")]
    Io {
        lock_file: String,
        #[source]
        source: io::Error,
    },
}

impl From<LockError> for LinkError {
    fn from(err: LockError) -> Self {
        let kind = match &err {
            LockError::Held { .. } => LinkErrorKind::RunInProgress,
            LockError::Io { .. } => LinkErrorKind::Filesystem,
        };
        LinkError::new(kind, err.to_string())
    }
}

/// Run-in-progress marker for one local folder; released on drop.
///
/// The marker lives in `lock_dir`, not in the folder, so it is never staged.
#[derive(Debug)]
pub struct RunLock {
    lock_file: PathBuf,
}

impl RunLock {
    /// Takes the lock for `local_path`. A lock left by a process that no longer
    /// runs is removed and taken over.
    pub fn acquire(local_path: &Path, lock_dir: &Path) -> Result<Self, LockError> {
        let canonical = fs::canonicalize(local_path).unwrap_or_else(|_| local_path.to_path_buf());
        let lock_file = lock_dir.join(lock_file_name(&canonical));
        let io_error = |source| LockError::Io {
            lock_file: lock_file.display().to_string(),
            source,
        };

        fs::create_dir_all(lock_dir).map_err(io_error)?;
        let mut reclaimed = false;
        let mut file = loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_file)
            {
                Ok(file) => break file,
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    if !reclaimed {
                        if let Some(pid) = dead_owner(&lock_file) {
                            linker_warn!(
                                "removing stale run lock {:?} left by process {}",
                                lock_file,
                                pid
                            );
                            fs::remove_file(&lock_file).map_err(io_error)?;
                            reclaimed = true;
                            continue;
                        }
                    }
                    return Err(LockError::Held {
                        path: canonical.display().to_string(),
                        lock_file: lock_file.display().to_string(),
                    });
                }
                Err(err) => return Err(io_error(err)),
            }
        };
        // Owner info: the pid lets a later run detect a crashed owner.
        if let Err(err) = writeln!(file, "{}\n{}", std::process::id(), canonical.display()) {
            linker_warn!("cannot record owner in run lock {:?}: {}", lock_file, err);
        }
        linker_debug!("acquired run lock {:?}", lock_file);
        Ok(Self { lock_file })
    }
}

/// Pid recorded in `lock_file` when that process is known to be gone.
///
/// Unreadable or empty files count as held: the owner may still be writing.
fn dead_owner(lock_file: &Path) -> Option<u32> {
    let content = fs::read_to_string(lock_file).ok()?;
    let pid: u32 = content.lines().next()?.trim().parse().ok()?;
    (pid != std::process::id() && !process_alive(pid)).then_some(pid)
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

// No cheap liveness check elsewhere; stale locks are removed by hand.
#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    true
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.lock_file) {
            linker_warn!("failed to remove run lock {:?}: {}", self.lock_file, err);
        }
    }
}

/// `repo-linker-{hash}.lock`, hash being the first 8 bytes of SHA-256 of the path.
pub fn lock_file_name(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    format!("repo-linker-{hex}.lock")
}
