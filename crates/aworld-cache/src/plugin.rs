//! C13: installs, lists, and removes plugins under `~/.aworld/plugins`,
//! tracking them in a flat JSON manifest rewritten wholesale on every
//! mutation.

use crate::error::{CacheError, Result};
use crate::git;
use crate::reference::{self, GitRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const MANIFEST_FILE: &str = ".manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginEntry {
    pub name: String,
    pub source: String,
    pub installed_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    #[serde(flatten)]
    entries: BTreeMap<String, PluginEntry>,
}

pub struct PluginManager {
    root: PathBuf,
}

impl PluginManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    fn plugin_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Where a plugin's checked-out `agents`/`skills` trees actually live.
    /// Nested under a literal `inner_plugins/<name>` segment so that every
    /// agent loaded from here satisfies the plugin-phase substring check in
    /// the multi-source loader without a special case.
    pub fn agents_root(&self, name: &str) -> PathBuf {
        self.plugin_dir(name).join("inner_plugins").join(name)
    }

    fn load_manifest(&self) -> Result<Manifest> {
        let path = self.manifest_path();
        if !path.is_file() {
            return Ok(Manifest::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| CacheError::ManifestRead {
            path: path.clone(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&contents).map_err(|e| CacheError::ManifestRead {
            path,
            message: e.to_string(),
        })
    }

    fn save_manifest(&self, manifest: &Manifest) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.manifest_path();
        let json = serde_json::to_string_pretty(manifest).map_err(|e| CacheError::ManifestWrite {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|e| CacheError::ManifestWrite {
            path,
            message: e.to_string(),
        })
    }

    /// Install a plugin from a GitHub reference or shorthand, or a local
    /// directory copy when `source` is not git-shaped.
    pub fn install(&self, name: &str, source: &str, force: bool) -> Result<PluginEntry> {
        let manifest = self.load_manifest()?;
        let target = self.agents_root(name);

        if manifest.entries.contains_key(name) && !force {
            return Err(CacheError::PluginAlreadyInstalled(name.to_string()));
        }

        if force && target.is_dir() {
            std::fs::remove_dir_all(&target)?;
        }

        if reference::is_git_reference(source) || looks_like_shorthand(source) {
            let git_ref = reference::parse_plugin_source(source)
                .ok_or_else(|| CacheError::InvalidReference(source.to_string()))?;
            self.install_from_git(&target, &git_ref)?;
        } else {
            self.install_from_local(&target, Path::new(source))?;
        }

        let entry = PluginEntry {
            name: name.to_string(),
            source: source.to_string(),
            installed_at: Utc::now(),
        };

        let mut manifest = self.load_manifest()?;
        manifest.entries.insert(name.to_string(), entry.clone());
        self.save_manifest(&manifest)?;

        Ok(entry)
    }

    fn install_from_git(&self, target: &Path, git_ref: &GitRef) -> Result<()> {
        if target.is_dir() {
            if git::fetch_checkout_pull(target, &git_ref.branch).is_ok() {
                return Ok(());
            }
            std::fs::remove_dir_all(target)?;
        }
        git::shallow_clone(&git_ref.clone_url, &git_ref.branch, target)
    }

    fn install_from_local(&self, target: &Path, source: &Path) -> Result<()> {
        if !source.is_dir() {
            return Err(CacheError::InvalidReference(source.display().to_string()));
        }
        copy_dir_recursive(source, target)
    }

    pub fn list(&self) -> Result<Vec<PluginEntry>> {
        let manifest = self.load_manifest()?;
        Ok(manifest.entries.into_values().collect())
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let mut manifest = self.load_manifest()?;
        if manifest.entries.remove(name).is_none() {
            return Err(CacheError::PluginNotFound(name.to_string()));
        }
        let target = self.plugin_dir(name);
        if target.is_dir() {
            std::fs::remove_dir_all(&target)?;
        }
        self.save_manifest(&manifest)
    }

    /// Roots of currently installed plugins, for C6's plugin phase — each
    /// one is the `inner_plugins/<name>` directory whose `agents`/`skills`
    /// subtrees the loader scans.
    pub fn installed_roots(&self) -> Result<Vec<PathBuf>> {
        Ok(self
            .list()?
            .into_iter()
            .map(|entry| self.agents_root(&entry.name))
            .filter(|path| path.is_dir())
            .collect())
    }
}

fn looks_like_shorthand(source: &str) -> bool {
    let mut parts = source.splitn(3, '/');
    let owner = parts.next().unwrap_or_default();
    let repo = parts.next();
    repo.is_some() && !owner.is_empty() && !owner.contains('.') && !source.starts_with('/') && !source.starts_with('.')
}

fn copy_dir_recursive(source: &Path, target: &Path) -> Result<()> {
    std::fs::create_dir_all(target)?;
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let dest = target.join(entry.file_name());
        if file_type.is_dir() {
            if entry.file_name() == ".git" {
                continue;
            }
            copy_dir_recursive(&entry.path(), &dest)?;
        } else if file_type.is_file() {
            std::fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn install_from_local_copies_tree() {
        let root = tempdir().unwrap();
        let source = tempdir().unwrap();
        std::fs::write(source.path().join("agent.md"), "hello").unwrap();

        let manager = PluginManager::new(root.path());
        let entry = manager
            .install("demo", source.path().to_str().unwrap(), false)
            .unwrap();

        assert_eq!(entry.name, "demo");
        assert!(manager.agents_root("demo").join("agent.md").is_file());
    }

    #[test]
    fn reinstall_without_force_fails() {
        let root = tempdir().unwrap();
        let source = tempdir().unwrap();
        std::fs::write(source.path().join("a.md"), "x").unwrap();
        let manager = PluginManager::new(root.path());
        manager
            .install("demo", source.path().to_str().unwrap(), false)
            .unwrap();
        let second = manager.install("demo", source.path().to_str().unwrap(), false);
        assert!(matches!(second, Err(CacheError::PluginAlreadyInstalled(_))));
    }

    #[test]
    fn list_and_remove_round_trip() {
        let root = tempdir().unwrap();
        let source = tempdir().unwrap();
        std::fs::write(source.path().join("a.md"), "x").unwrap();
        let manager = PluginManager::new(root.path());
        manager
            .install("demo", source.path().to_str().unwrap(), false)
            .unwrap();

        assert_eq!(manager.list().unwrap().len(), 1);
        manager.remove("demo").unwrap();
        assert!(manager.list().unwrap().is_empty());
        assert!(!root.path().join("demo").exists());
    }

    #[test]
    fn remove_missing_plugin_errors() {
        let root = tempdir().unwrap();
        let manager = PluginManager::new(root.path());
        assert!(matches!(manager.remove("ghost"), Err(CacheError::PluginNotFound(_))));
    }

    #[test]
    fn shorthand_detection() {
        assert!(looks_like_shorthand("acme/skills"));
        assert!(!looks_like_shorthand("./local/path"));
        assert!(!looks_like_shorthand("/abs/path"));
    }

    #[test]
    fn agents_root_satisfies_inner_plugins_substring_check() {
        let root = tempdir().unwrap();
        let manager = PluginManager::new(root.path());
        assert!(manager.agents_root("demo").to_string_lossy().contains("inner_plugins"));
    }

    #[test]
    fn installed_roots_reflects_manifest() {
        let root = tempdir().unwrap();
        let source = tempdir().unwrap();
        std::fs::write(source.path().join("a.md"), "x").unwrap();
        let manager = PluginManager::new(root.path());
        manager.install("demo", source.path().to_str().unwrap(), false).unwrap();

        let roots = manager.installed_roots().unwrap();
        assert_eq!(roots, vec![manager.agents_root("demo")]);
    }
}
