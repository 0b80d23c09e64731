//! File-based locking using `flock(2)` syscall directly.
//!
//! Uses raw `libc::flock` instead of RAII lock wrappers to avoid the
//! self-referential struct problem: an RAII guard borrows the lock owner,
//! making it impossible to store both in the same struct without lifetime
//! gymnastics (`Box::leak`, `ouroboros`, etc.).
//!
//! By calling `flock(2)` directly, we only need to own the `File` (which
//! owns the fd). `Drop` calls `flock(fd, LOCK_UN)` to release.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

/// Diagnostic information written to lock files.
#[derive(Debug, Serialize, Deserialize)]
struct LockDiagnostic {
    pid: u32,
    reason: String,
    acquired_at: DateTime<Utc>,
}

/// Advisory lock guard backed by `flock(2)`. Blocks (not non-blocking) the
/// caller until the lock is available, since cache resolution is expected
/// to wait for a concurrent resolve of the same key rather than fail.
pub struct PathLock {
    file: File,
    lock_path: PathBuf,
}

impl std::fmt::Debug for PathLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathLock")
            .field("lock_path", &self.lock_path)
            .finish()
    }
}

impl Drop for PathLock {
    fn drop(&mut self) {
        let fd = self.file.as_raw_fd();
        // SAFETY: `fd` is a valid file descriptor owned by `self.file`.
        unsafe {
            libc::flock(fd, libc::LOCK_UN);
        }
    }
}

impl PathLock {
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

/// Acquire a blocking exclusive lock keyed by `key` under `lock_dir`.
///
/// Lock path: `{lock_dir}/{key}.lock`. Intended for serializing concurrent
/// cache writes to the same on-disk target within one process; across
/// processes the lock is best-effort (another process racing the same key
/// will block on the same file rather than corrupt the checkout).
pub fn acquire(lock_dir: &Path, key: &str, reason: &str) -> Result<PathLock> {
    fs::create_dir_all(lock_dir)
        .with_context(|| format!("failed to create lock directory: {}", lock_dir.display()))?;

    let lock_path = lock_dir.join(format!("{key}.lock"));

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .with_context(|| format!("failed to open lock file: {}", lock_path.display()))?;

    let fd = file.as_raw_fd();

    // SAFETY: `fd` is a valid file descriptor from the `File` we just opened.
    // Blocking exclusive lock — we want to wait out a concurrent resolve.
    let ret = unsafe { libc::flock(fd, libc::LOCK_EX) };
    if ret != 0 {
        anyhow::bail!("flock failed on {}", lock_path.display());
    }

    let diagnostic = LockDiagnostic {
        pid: std::process::id(),
        reason: reason.to_string(),
        acquired_at: Utc::now(),
    };
    if let Ok(json) = serde_json::to_string(&diagnostic) {
        let _ = file.set_len(0);
        let _ = file.write_all(json.as_bytes());
        let _ = file.flush();
    }

    Ok(PathLock { file, lock_path })
}

/// Read the diagnostic of whoever currently holds (or last held) a lock,
/// without attempting to acquire it.
pub fn inspect(lock_dir: &Path, key: &str) -> Option<String> {
    let lock_path = lock_dir.join(format!("{key}.lock"));
    let mut contents = String::new();
    File::open(lock_path).ok()?.read_to_string(&mut contents).ok()?;
    Some(contents)
}
