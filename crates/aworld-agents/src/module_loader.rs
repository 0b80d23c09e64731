//! C4: the systems-language analogue of "import a Python file and let its
//! `@agent` decorators fire". A compiled binary has no import-time side
//! effects, so discovery targets shared libraries instead of source files:
//! each candidate is `dlopen`ed and a well-known exported symbol is called,
//! which is expected to call back into [`AgentRegistry::register`].

use crate::registry::AgentRegistry;
use libloading::{Library, Symbol};
use std::path::{Path, PathBuf};
use tracing::warn;

/// The symbol every agent module must export. Its signature is
/// `extern "C" fn(&AgentRegistry)`.
pub const REGISTRATION_SYMBOL: &[u8] = b"aworld_register_agents";

type RegisterFn = unsafe extern "C" fn(&AgentRegistry);

const LIBRARY_EXTENSIONS: &[&str] = &["so", "dylib", "dll"];

/// Recursively find candidate shared libraries under `root`.
pub fn discover_modules(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    walk(root, &mut found);
    found
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, found);
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| LIBRARY_EXTENSIONS.contains(&ext))
            .unwrap_or(false)
        {
            found.push(path);
        }
    }
}

/// Load one module and invoke its registration export. Failures (missing
/// library, missing symbol) are logged and isolated to this file, matching
/// the per-file failure isolation of the original loader.
pub fn load_module(path: &Path, registry: &AgentRegistry) -> bool {
    let library = match unsafe { Library::new(path) } {
        Ok(lib) => lib,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to load agent module");
            return false;
        }
    };

    let register: Symbol<RegisterFn> = match unsafe { library.get(REGISTRATION_SYMBOL) } {
        Ok(sym) => sym,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "agent module missing registration symbol");
            return false;
        }
    };

    unsafe {
        register(registry);
    }
    true
}

/// Discover and load every module under `root`, returning the number that
/// loaded successfully.
pub fn load_all(root: &Path, registry: &AgentRegistry) -> usize {
    discover_modules(root)
        .iter()
        .filter(|path| load_module(path, registry))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn discovers_known_library_extensions() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("a.so"), b"").unwrap();
        std::fs::write(dir.path().join("nested").join("b.dylib"), b"").unwrap();
        std::fs::write(dir.path().join("ignore.txt"), b"").unwrap();

        let found = discover_modules(dir.path());
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn loading_a_non_library_file_fails_gracefully() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("not_a_library.so");
        std::fs::write(&path, b"not an elf file").unwrap();
        let registry = AgentRegistry::new();
        assert!(!load_module(&path, &registry));
    }

    #[test]
    fn loading_missing_file_fails_gracefully() {
        let dir = tempdir().unwrap();
        let registry = AgentRegistry::new();
        assert!(!load_module(&dir.path().join("missing.so"), &registry));
    }
}
