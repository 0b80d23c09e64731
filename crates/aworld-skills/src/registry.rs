use crate::discover;
use aworld_cache::CacheManager;
use aworld_core::{SkillConflictPolicy, SkillEntry, SkillError, SkillSource};
use regex::RegexBuilder;
use std::collections::HashMap;
use tracing::warn;

pub struct SkillRegistry {
    cache: CacheManager,
    conflict_policy: SkillConflictPolicy,
    skills: HashMap<String, SkillEntry>,
    /// Which source-key currently owns each skill name.
    owners: HashMap<String, String>,
    sources: HashMap<String, SkillSource>,
}

impl SkillRegistry {
    pub fn new(cache: CacheManager, conflict_policy: SkillConflictPolicy) -> Self {
        Self {
            cache,
            conflict_policy,
            skills: HashMap::new(),
            owners: HashMap::new(),
            sources: HashMap::new(),
        }
    }

    fn source_key(reference: &str, alias: Option<&str>) -> String {
        alias.map(str::to_string).unwrap_or_else(|| reference.to_string())
    }

    /// Resolve `reference` via the cache manager, walk it for skill files,
    /// and register each under the conflict policy. Returns the number of
    /// skills newly contributed by this call.
    pub fn register_source(
        &mut self,
        reference: &str,
        alias: Option<&str>,
        force_reload: bool,
    ) -> Result<usize, SkillError> {
        let key = Self::source_key(reference, alias);
        if force_reload && self.sources.contains_key(&key) {
            self.unregister_source(&key);
        }

        let resolved_path = self
            .cache
            .resolve(reference)
            .map_err(|_| SkillError::UnknownSource(reference.to_string()))?;

        let mut contributed = Vec::new();
        for path in discover::find_skill_files(&resolved_path) {
            let Some(entry) = discover::parse_skill_file(&path) else {
                continue;
            };
            let name = entry.name.clone();

            if let Some(existing_owner) = self.owners.get(&name) {
                if existing_owner != &key {
                    match self.conflict_policy {
                        SkillConflictPolicy::KeepFirst => {
                            warn!(name = %name, existing = %existing_owner, "skill name conflict, keeping first");
                            continue;
                        }
                        SkillConflictPolicy::KeepLast => {
                            if let Some(prev_source) = self.sources.get_mut(existing_owner) {
                                prev_source.skill_names.retain(|n| n != &name);
                            }
                        }
                        SkillConflictPolicy::Raise => {
                            return Err(SkillError::Collision(name, existing_owner.clone()));
                        }
                    }
                }
            }

            self.owners.insert(name.clone(), key.clone());
            self.skills.insert(name.clone(), entry);
            contributed.push(name);
        }

        let count = contributed.len();
        self.sources.insert(
            key.clone(),
            SkillSource {
                source_key: key,
                reference: reference.to_string(),
                resolved_path,
                skill_names: contributed,
            },
        );

        Ok(count)
    }

    pub fn unregister_source(&mut self, alias: &str) {
        let Some(source) = self.sources.remove(alias) else {
            return;
        };
        for name in &source.skill_names {
            if self.owners.get(name).map(String::as_str) == Some(alias) {
                self.owners.remove(name);
                self.skills.remove(name);
            }
        }
    }

    pub fn reload_source(&mut self, alias: &str, reference: &str) -> Result<usize, SkillError> {
        self.register_source(reference, Some(alias), true)
    }

    pub fn get(&self, name: &str) -> Option<&SkillEntry> {
        self.skills.get(name)
    }

    pub fn get_all(&self) -> Vec<&SkillEntry> {
        self.skills.values().collect()
    }

    pub fn list_sources(&self) -> Vec<&SkillSource> {
        self.sources.values().collect()
    }

    pub fn list_skills(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.skills.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn search(&self, keyword: &str, fields: Option<&[&str]>) -> Vec<&SkillEntry> {
        let needle = keyword.to_lowercase();
        let fields = fields.unwrap_or(&["name", "description", "usage"]);
        self.skills
            .values()
            .filter(|skill| {
                fields.iter().any(|field| {
                    let haystack = match *field {
                        "name" => skill.name.as_str(),
                        "description" => skill.description.as_str(),
                        "usage" => skill.usage.as_str(),
                        "type" => skill.skill_type.as_str(),
                        _ => "",
                    };
                    haystack.to_lowercase().contains(&needle)
                })
            })
            .collect()
    }

    pub fn get_by_regex(&self, pattern: &str, field: &str, case_insensitive: bool) -> Result<Vec<&SkillEntry>, SkillError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| SkillError::InvalidRegex(pattern.to_string(), e.to_string()))?;

        Ok(self
            .skills
            .values()
            .filter(|skill| {
                let haystack = match field {
                    "name" => skill.name.as_str(),
                    "description" => skill.description.as_str(),
                    "usage" => skill.usage.as_str(),
                    "type" => skill.skill_type.as_str(),
                    _ => "",
                };
                regex.is_match(haystack)
            })
            .collect())
    }

    /// Projection used by the chat surface to describe available skills to
    /// an agent: name -> {desc, usage, tool-list, type, active}.
    pub fn get_skill_configs(&self) -> HashMap<String, SkillEntry> {
        self.skills.clone()
    }

    /// Re-resolve and reload every registered source (used for git-backed
    /// sources whose upstream may have moved on).
    pub fn update_cache(&mut self) -> Vec<(String, Result<usize, SkillError>)> {
        let keys: Vec<String> = self.sources.keys().cloned().collect();
        let mut results = Vec::new();
        for key in keys {
            let reference = self.sources.get(&key).map(|s| s.reference.clone()).unwrap_or_default();
            let result = self.reload_source(&key, &reference);
            results.push((key, result));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aworld_cache::CacheManager;
    use tempfile::tempdir;

    fn write_skill(dir: &std::path::Path, name: &str) {
        std::fs::write(
            dir.join("skill.md"),
            format!("---\nname: {name}\ndescription: does things\n---\n"),
        )
        .unwrap();
    }

    #[test]
    fn register_and_get() {
        let cache_dir = tempdir().unwrap();
        let source_dir = tempdir().unwrap();
        write_skill(source_dir.path(), "weather");

        let mut registry = SkillRegistry::new(CacheManager::new(cache_dir.path()), SkillConflictPolicy::KeepFirst);
        let count = registry.register_source(source_dir.path().to_str().unwrap(), Some("local"), false).unwrap();

        assert_eq!(count, 1);
        assert!(registry.get("weather").is_some());
        assert_eq!(registry.list_sources().len(), 1);
    }

    #[test]
    fn keep_first_policy_ignores_later_conflict() {
        let cache_dir = tempdir().unwrap();
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        write_skill(first.path(), "weather");
        write_skill(second.path(), "weather");

        let mut registry = SkillRegistry::new(CacheManager::new(cache_dir.path()), SkillConflictPolicy::KeepFirst);
        registry.register_source(first.path().to_str().unwrap(), Some("a"), false).unwrap();
        registry.register_source(second.path().to_str().unwrap(), Some("b"), false).unwrap();

        let entry = registry.get("weather").unwrap();
        assert_eq!(entry.source_path, first.path().join("skill.md"));
    }

    #[test]
    fn raise_policy_fails_registration() {
        let cache_dir = tempdir().unwrap();
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        write_skill(first.path(), "weather");
        write_skill(second.path(), "weather");

        let mut registry = SkillRegistry::new(CacheManager::new(cache_dir.path()), SkillConflictPolicy::Raise);
        registry.register_source(first.path().to_str().unwrap(), Some("a"), false).unwrap();
        let result = registry.register_source(second.path().to_str().unwrap(), Some("b"), false);
        assert!(matches!(result, Err(SkillError::Collision(_, _))));
    }

    #[test]
    fn unregister_removes_only_owned_skills() {
        let cache_dir = tempdir().unwrap();
        let source_dir = tempdir().unwrap();
        write_skill(source_dir.path(), "weather");

        let mut registry = SkillRegistry::new(CacheManager::new(cache_dir.path()), SkillConflictPolicy::KeepFirst);
        registry.register_source(source_dir.path().to_str().unwrap(), Some("a"), false).unwrap();
        registry.unregister_source("a");

        assert!(registry.get("weather").is_none());
        assert!(registry.list_sources().is_empty());
    }

    #[test]
    fn update_cache_reloads_from_original_reference_not_resolved_path() {
        let cache_dir = tempdir().unwrap();
        let source_dir = tempdir().unwrap();
        write_skill(source_dir.path(), "weather");

        let mut registry = SkillRegistry::new(CacheManager::new(cache_dir.path()), SkillConflictPolicy::KeepFirst);
        let reference = source_dir.path().to_str().unwrap();
        registry.register_source(reference, Some("a"), false).unwrap();

        assert_eq!(registry.sources.get("a").unwrap().reference, reference);

        let results = registry.update_cache();
        assert_eq!(results.len(), 1);
        assert!(results[0].1.is_ok());
        assert!(registry.get("weather").is_some());
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let cache_dir = tempdir().unwrap();
        let source_dir = tempdir().unwrap();
        write_skill(source_dir.path(), "weather");

        let mut registry = SkillRegistry::new(CacheManager::new(cache_dir.path()), SkillConflictPolicy::KeepFirst);
        registry.register_source(source_dir.path().to_str().unwrap(), Some("a"), false).unwrap();

        assert_eq!(registry.search("WEATHER", None).len(), 1);
        assert_eq!(registry.search("nonexistent", None).len(), 0);
    }
}
