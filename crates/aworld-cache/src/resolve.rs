//! C2: turns a skill-or-plugin reference into a local directory, caching
//! git checkouts under a configured root and serializing concurrent
//! resolves of the same cache path.

use crate::error::{CacheError, Result};
use crate::git;
use crate::reference::{self, GitRef};
use std::path::{Path, PathBuf};
use tracing::warn;

pub struct CacheManager {
    cache_root: PathBuf,
    lock_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        let cache_root = cache_root.into();
        let lock_dir = cache_root.join(".locks");
        Self { cache_root, lock_dir }
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Resolve `reference` to a local directory. Local paths are returned
    /// as-is (after existence check); git references are cloned/updated
    /// under the cache root.
    pub fn resolve(&self, reference: &str) -> Result<PathBuf> {
        if !reference::is_git_reference(reference) {
            let path = PathBuf::from(reference);
            if !path.is_dir() {
                return Err(CacheError::InvalidReference(reference.to_string()));
            }
            return Ok(path);
        }

        let git_ref = reference::parse_github_url(reference)
            .ok_or_else(|| CacheError::InvalidReference(reference.to_string()))?;

        let checkout = self
            .cache_root
            .join(&git_ref.owner)
            .join(&git_ref.repo)
            .join(&git_ref.branch);

        let lock_key = format!("{}_{}_{}", git_ref.owner, git_ref.repo, git_ref.branch);
        let _lock = aworld_lock::acquire(&self.lock_dir, &lock_key, reference)?;

        self.ensure_checkout(&checkout, &git_ref)?;

        match &git_ref.subdirectory {
            Some(sub) => Ok(checkout.join(sub)),
            None => Ok(checkout),
        }
    }

    /// Clone, or update-in-place with reclone-on-failure fallback.
    fn ensure_checkout(&self, checkout: &Path, git_ref: &GitRef) -> Result<()> {
        if !checkout.is_dir() {
            return git::shallow_clone(&git_ref.clone_url, &git_ref.branch, checkout);
        }

        if let Err(err) = git::fetch_checkout_pull(checkout, &git_ref.branch) {
            warn!(
                path = %checkout.display(),
                error = %err,
                "cache update failed, reverting to a fresh clone"
            );
            let _ = std::fs::remove_dir_all(checkout);
            return git::shallow_clone(&git_ref.clone_url, &git_ref.branch, checkout);
        }

        Ok(())
    }
}
