//! C1: maintains a process-wide set of skill sources and the skills they
//! contribute. One `SkillRegistry` is usually shared behind a
//! `std::sync::OnceLock` via [`default_registry`].

mod discover;
mod registry;

pub use registry::SkillRegistry;

use aworld_cache::CacheManager;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

/// Env var carrying a `;`-separated list of local skill directories to
/// register at process start.
pub const SKILLS_PATH_ENV: &str = "SKILLS_PATH";
/// Legacy single-directory env var, still honored alongside `SKILLS_PATH`.
pub const SKILLS_DIR_ENV: &str = "SKILLS_DIR";
/// Overrides the cache root git-backed skill sources are checked out under.
pub const SKILLS_CACHE_DIR_ENV: &str = "SKILLS_CACHE_DIR";

fn default_skills_dir() -> anyhow::Result<PathBuf> {
    let base = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(base.home_dir().join(".aworld").join("skills"))
}

/// Build and populate a registry the way the process-wide singleton does:
/// `SKILLS_PATH` entries, then `SKILLS_DIR`, then caller-supplied extra
/// paths, then `./skills` if present. Exposed directly (rather than hidden
/// behind the singleton) so callers can construct scoped registries too.
pub fn bootstrap(extra_paths: &[PathBuf]) -> anyhow::Result<SkillRegistry> {
    let cache_root = std::env::var(SKILLS_CACHE_DIR_ENV)
        .map(PathBuf::from)
        .or_else(|_| default_skills_dir())?;
    let cache = CacheManager::new(cache_root);
    let mut registry = SkillRegistry::new(cache, Default::default());

    match std::env::var(SKILLS_PATH_ENV) {
        Ok(raw) => {
            for path in raw.split(';').filter(|p| !p.is_empty()) {
                let _ = registry.register_source(path, None, false);
            }
        }
        Err(_) => {
            let default_dir = default_skills_dir()?;
            std::fs::create_dir_all(&default_dir)?;
            let _ = registry.register_source(default_dir.to_str().unwrap_or_default(), None, false);
        }
    }

    if let Ok(legacy) = std::env::var(SKILLS_DIR_ENV) {
        if !legacy.is_empty() {
            let _ = registry.register_source(&legacy, None, false);
        }
    }

    for path in extra_paths {
        if let Some(s) = path.to_str() {
            let _ = registry.register_source(s, None, false);
        }
    }

    let cwd_skills = PathBuf::from("./skills");
    if cwd_skills.is_dir() {
        let _ = registry.register_source("./skills", None, false);
    }

    Ok(registry)
}

static DEFAULT_REGISTRY: OnceLock<Mutex<SkillRegistry>> = OnceLock::new();

/// The process-wide registry, lazily bootstrapped on first access.
pub fn default_registry() -> &'static Mutex<SkillRegistry> {
    DEFAULT_REGISTRY.get_or_init(|| {
        Mutex::new(bootstrap(&[]).unwrap_or_else(|_| {
            SkillRegistry::new(CacheManager::new(PathBuf::from(".aworld-skills-cache")), Default::default())
        }))
    })
}
