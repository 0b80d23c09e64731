pub mod error;
mod git;
pub mod plugin;
pub mod reference;
mod resolve;

pub use error::{CacheError, Result};
pub use plugin::{PluginEntry, PluginManager};
pub use reference::{is_git_reference, parse_github_url, parse_plugin_source, GitRef};
pub use resolve::CacheManager;

use directories::BaseDirs;
use std::path::PathBuf;

/// Default cache root: `~/.aworld/skills`.
pub fn default_skills_cache_root() -> anyhow::Result<PathBuf> {
    let base = BaseDirs::new().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(base.home_dir().join(".aworld").join("skills"))
}

/// Default plugin install root: `~/.aworld/plugins`.
pub fn default_plugin_root() -> anyhow::Result<PathBuf> {
    let base = BaseDirs::new().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(base.home_dir().join(".aworld").join("plugins"))
}
