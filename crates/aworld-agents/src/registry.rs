//! C5: process-wide agent descriptor store. Guarded by a re-entrant mutex
//! because registration can be triggered from inside another registration
//! (a dynamic-library agent module's registration callback can itself load
//! further modules).

use aworld_core::{AgentDescriptor, AgentError};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::collections::HashMap;

pub struct AgentRegistry {
    inner: ReentrantMutex<RefCell<HashMap<String, AgentDescriptor>>>,
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            inner: ReentrantMutex::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn register(&self, descriptor: AgentDescriptor) {
        let guard = self.inner.lock();
        let mut map = guard.borrow_mut();
        let key = descriptor.registry_key();
        if map.contains_key(&key) {
            tracing::warn!(key = %key, "overwriting existing agent registration");
        }
        map.insert(key, descriptor);
    }

    /// Validate the whole batch (non-empty names, unique within the batch,
    /// no collision with an already-registered key) before committing any
    /// of it.
    pub fn register_many(&self, descriptors: Vec<AgentDescriptor>) -> Result<(), AgentError> {
        let mut seen = std::collections::HashSet::new();
        for descriptor in &descriptors {
            if descriptor.name.is_empty() {
                return Err(AgentError::EmptyName);
            }
            let key = descriptor.registry_key();
            if !seen.insert(key.clone()) {
                return Err(AgentError::DuplicateInBatch(key));
            }
        }

        let guard = self.inner.lock();
        let map = guard.borrow();
        for key in &seen {
            if map.contains_key(key) {
                return Err(AgentError::Collision(key.clone()));
            }
        }
        drop(map);

        let mut map = guard.borrow_mut();
        for descriptor in descriptors {
            let key = descriptor.registry_key();
            map.insert(key, descriptor);
        }
        Ok(())
    }

    pub fn unregister(&self, key: &str) -> bool {
        let guard = self.inner.lock();
        guard.borrow_mut().remove(key).is_some()
    }

    /// Exact match when `version` is given; otherwise the bare name if
    /// present, else the highest `name:v<N>` entry.
    pub fn get(&self, name: &str, version: Option<&str>) -> Option<AgentDescriptor> {
        let guard = self.inner.lock();
        let map = guard.borrow();

        if let Some(version) = version {
            return map.get(&format!("{name}:{version}")).cloned();
        }

        if let Some(descriptor) = map.get(name) {
            return Some(descriptor.clone());
        }

        let prefix = format!("{name}:v");
        map.iter()
            .filter_map(|(key, descriptor)| {
                key.strip_prefix(&prefix)
                    .and_then(|n| n.parse::<u64>().ok())
                    .map(|n| (n, descriptor))
            })
            .max_by_key(|(n, _)| *n)
            .map(|(_, descriptor)| descriptor.clone())
    }

    pub fn exists(&self, key: &str) -> bool {
        let guard = self.inner.lock();
        guard.borrow().contains_key(key)
    }

    pub fn list_agents(&self) -> Vec<AgentDescriptor> {
        let guard = self.inner.lock();
        guard.borrow().values().cloned().collect()
    }

    pub fn list_names(&self) -> Vec<String> {
        let guard = self.inner.lock();
        let mut names: Vec<String> = guard
            .borrow()
            .keys()
            .map(|key| key.split(':').next().unwrap_or(key).to_string())
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .collect();
        names.sort();
        names
    }

    pub fn clear(&self) {
        let guard = self.inner.lock();
        guard.borrow_mut().clear();
    }
}

/// Derives a `v<N>` version suffix from a directory name shaped like
/// `<base>_v<N>`, the fallback used when a descriptor carries no explicit
/// `metadata.version`.
pub fn derive_version_from_dir_name(dir_name: &str) -> Option<String> {
    let (_, suffix) = dir_name.rsplit_once("_v")?;
    suffix.parse::<u64>().ok().map(|n| format!("v{n}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aworld_core::{FixedSwarm, Swarm};
    use std::sync::Arc;

    fn descriptor(name: &str, version: Option<&str>) -> AgentDescriptor {
        AgentDescriptor {
            name: name.to_string(),
            description: String::new(),
            version: version.map(str::to_string),
            builder: Arc::new(FixedSwarm(Swarm { root_agent: name.to_string() })),
            hooks: Vec::new(),
            register_dir: None,
            source_file: None,
            metadata: Default::default(),
        }
    }

    #[test]
    fn register_and_exact_get() {
        let registry = AgentRegistry::new();
        registry.register(descriptor("echo", None));
        assert!(registry.get("echo", None).is_some());
        assert!(registry.exists("echo"));
    }

    #[test]
    fn get_without_version_returns_highest() {
        let registry = AgentRegistry::new();
        registry.register(descriptor("echo", Some("v1")));
        registry.register(descriptor("echo", Some("v3")));
        registry.register(descriptor("echo", Some("v2")));

        let resolved = registry.get("echo", None).unwrap();
        assert_eq!(resolved.version.as_deref(), Some("v3"));
    }

    #[test]
    fn get_with_explicit_version() {
        let registry = AgentRegistry::new();
        registry.register(descriptor("echo", Some("v1")));
        registry.register(descriptor("echo", Some("v2")));
        let resolved = registry.get("echo", Some("v1")).unwrap();
        assert_eq!(resolved.version.as_deref(), Some("v1"));
    }

    #[test]
    fn register_many_rejects_duplicate_within_batch() {
        let registry = AgentRegistry::new();
        let result = registry.register_many(vec![descriptor("a", None), descriptor("a", None)]);
        assert!(matches!(result, Err(AgentError::DuplicateInBatch(_))));
        assert!(registry.list_agents().is_empty());
    }

    #[test]
    fn register_many_rejects_collision_with_existing() {
        let registry = AgentRegistry::new();
        registry.register(descriptor("a", None));
        let result = registry.register_many(vec![descriptor("a", None)]);
        assert!(matches!(result, Err(AgentError::Collision(_))));
    }

    #[test]
    fn unregister_and_clear() {
        let registry = AgentRegistry::new();
        registry.register(descriptor("a", None));
        assert!(registry.unregister("a"));
        assert!(!registry.exists("a"));

        registry.register(descriptor("b", None));
        registry.clear();
        assert!(registry.list_agents().is_empty());
    }

    #[test]
    fn list_names_strips_versions_and_dedupes() {
        let registry = AgentRegistry::new();
        registry.register(descriptor("echo", Some("v1")));
        registry.register(descriptor("echo", Some("v2")));
        registry.register(descriptor("other", None));
        assert_eq!(registry.list_names(), vec!["echo".to_string(), "other".to_string()]);
    }

    #[test]
    fn version_derivation_from_directory_name() {
        assert_eq!(derive_version_from_dir_name("weather_v3"), Some("v3".to_string()));
        assert_eq!(derive_version_from_dir_name("weather"), None);
    }
}
