//! Thin wrapper over the `git` CLI with hard timeouts. Every invocation
//! runs on a watcher thread that SIGKILLs the child if it overruns its
//! budget, since `git` gives no portable async cancellation hook.

use crate::error::{CacheError, Result};
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub const CLONE_TIMEOUT: Duration = Duration::from_secs(120);
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(60);
pub const PULL_TIMEOUT: Duration = Duration::from_secs(60);
pub const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(10);
pub const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

pub fn git_available() -> bool {
    which::which("git").is_ok()
}

fn run(args: &[&str], dir: &Path, timeout: Duration, operation: &'static str) -> Result<()> {
    if !git_available() {
        return Err(CacheError::GitNotFound);
    }

    let mut child = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let pid = child.id();
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let watcher = thread::spawn(move || {
        if done_rx.recv_timeout(timeout).is_err() {
            // SAFETY: `pid` is the child's pid for the lifetime of this call;
            // killing a process that already exited is a harmless no-op error.
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGKILL);
            }
        }
    });

    let output = child.wait_with_output()?;
    let _ = done_tx.send(());
    let _ = watcher.join();

    if output.status.signal() == Some(libc::SIGKILL) {
        return Err(CacheError::Timeout {
            operation,
            path: dir.to_path_buf(),
            seconds: timeout.as_secs(),
        });
    }

    if !output.status.success() {
        return Err(CacheError::GitCommandFailed {
            operation,
            path: dir.to_path_buf(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(())
}

/// Shallow-clone `url` at `branch` into `target`, which must not yet exist.
pub fn shallow_clone(url: &str, branch: &str, target: &Path) -> Result<()> {
    if !git_available() {
        return Err(CacheError::GitNotFound);
    }
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let target_str = target.to_string_lossy().to_string();
    let outcome = run(
        &["clone", "--quiet", "--depth", "1", "--branch", branch, url, &target_str],
        parent,
        CLONE_TIMEOUT,
        "clone",
    );
    if outcome.is_err() {
        let _ = std::fs::remove_dir_all(target);
    }
    outcome
}

/// Update an existing checkout in place: fetch, checkout the branch, pull.
pub fn fetch_checkout_pull(repo_dir: &Path, branch: &str) -> Result<()> {
    run(&["fetch", "--quiet", "origin", branch], repo_dir, FETCH_TIMEOUT, "fetch")?;
    run(&["checkout", "--quiet", branch], repo_dir, CHECKOUT_TIMEOUT, "checkout")?;
    run(&["pull", "--quiet", "origin", branch], repo_dir, PULL_TIMEOUT, "pull")?;
    Ok(())
}
