//! C6: drives the full agent-loading lifecycle (plugin, local, remote
//! phases, in that strict order) and returns a deduplicated, precedence-
//! resolved list of [`AgentInfo`].

use crate::markdown;
use crate::module_loader;
use crate::registry::AgentRegistry;
use aworld_cache::PluginManager;
use aworld_core::{AgentInfo, AgentSourceType};
use aworld_remote::RemoteClient;
use aworld_skills::SkillRegistry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

pub struct LoadOptions {
    pub local_agent_dirs: Vec<PathBuf>,
    pub remote_backends: Vec<String>,
    pub plugin_root: Option<PathBuf>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            local_agent_dirs: vec![PathBuf::from("./agents")],
            remote_backends: Vec::new(),
            plugin_root: None,
        }
    }
}

/// Auxiliary record surfaced alongside each [`AgentInfo`] for the
/// dispatcher to decide how to execute a given agent.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    pub source_type: AgentSourceType,
    pub location: String,
    pub agents_dir: Option<PathBuf>,
}

pub struct LoadReport {
    pub agents: Vec<AgentInfo>,
    pub index: HashMap<String, SourceRecord>,
}

/// Run the three-phase load against `registry`/`skills`, returning the
/// deduplicated, precedence-resolved agent list.
pub async fn load(options: &LoadOptions, registry: &AgentRegistry, skills: &mut SkillRegistry) -> LoadReport {
    let mut index: HashMap<String, SourceRecord> = HashMap::new();
    let mut ordered_names: Vec<String> = Vec::new();
    let mut by_name: HashMap<String, AgentInfo> = HashMap::new();

    plugin_phase(options, registry, skills, &mut by_name, &mut ordered_names, &mut index);
    local_phase(options, registry, skills, &mut by_name, &mut ordered_names, &mut index);
    remote_phase(options, &mut by_name, &mut ordered_names, &mut index).await;

    let agents = ordered_names.into_iter().filter_map(|name| by_name.remove(&name)).collect();
    LoadReport { agents, index }
}

fn plugin_phase(
    options: &LoadOptions,
    registry: &AgentRegistry,
    skills: &mut SkillRegistry,
    by_name: &mut HashMap<String, AgentInfo>,
    ordered_names: &mut Vec<String>,
    index: &mut HashMap<String, SourceRecord>,
) {
    let plugin_root = match &options.plugin_root {
        Some(p) => p.clone(),
        None => match aworld_cache::default_plugin_root() {
            Ok(p) => p,
            Err(_) => return,
        },
    };

    let manager = PluginManager::new(&plugin_root);
    let roots = manager.installed_roots().unwrap_or_default();

    for plugin_dir in roots {
        let skills_dir = plugin_dir.join("skills");
        if has_skill_md(&skills_dir) {
            if let Some(s) = skills_dir.to_str() {
                let _ = skills.register_source(s, None, false);
            }
        }

        let agents_dir = plugin_dir.join("agents");
        if !agents_dir.is_dir() {
            continue;
        }

        module_loader::load_all(&agents_dir, registry);
        for path in markdown_files(&agents_dir) {
            if let Some(descriptor) = markdown::parse_markdown_agent(&path, skills) {
                registry.register(descriptor);
            }
        }

        for descriptor in registry.list_agents() {
            let Some(register_dir) = &descriptor.register_dir else { continue };
            if !register_dir.to_string_lossy().contains("inner_plugins") {
                continue;
            }
            insert(
                descriptor.name.clone(),
                AgentInfo {
                    name: descriptor.name.clone(),
                    description: descriptor.description.clone(),
                    source_type: AgentSourceType::Plugin,
                    source_location: plugin_dir.display().to_string(),
                    metadata: descriptor.metadata.clone(),
                },
                SourceRecord {
                    source_type: AgentSourceType::Plugin,
                    location: plugin_dir.display().to_string(),
                    agents_dir: Some(agents_dir.clone()),
                },
                by_name,
                ordered_names,
                index,
            );
        }
    }
}

fn local_phase(
    options: &LoadOptions,
    registry: &AgentRegistry,
    skills: &mut SkillRegistry,
    by_name: &mut HashMap<String, AgentInfo>,
    ordered_names: &mut Vec<String>,
    index: &mut HashMap<String, SourceRecord>,
) {
    let dirs = resolve_local_dirs(options);

    for dir in dirs {
        if !dir.is_dir() {
            continue;
        }

        module_loader::load_all(&dir, registry);
        for path in markdown_files(&dir) {
            if let Some(descriptor) = markdown::parse_markdown_agent(&path, skills) {
                registry.register(descriptor);
            }
        }

        for descriptor in registry.list_agents() {
            let owns_dir = descriptor
                .register_dir
                .as_ref()
                .map(|d| d.starts_with(&dir))
                .unwrap_or(false);
            if !owns_dir {
                continue;
            }
            insert(
                descriptor.name.clone(),
                AgentInfo {
                    name: descriptor.name.clone(),
                    description: descriptor.description.clone(),
                    source_type: AgentSourceType::Local,
                    source_location: dir.display().to_string(),
                    metadata: descriptor.metadata.clone(),
                },
                SourceRecord {
                    source_type: AgentSourceType::Local,
                    location: dir.display().to_string(),
                    agents_dir: Some(dir.clone()),
                },
                by_name,
                ordered_names,
                index,
            );
        }
    }
}

async fn remote_phase(
    options: &LoadOptions,
    by_name: &mut HashMap<String, AgentInfo>,
    ordered_names: &mut Vec<String>,
    index: &mut HashMap<String, SourceRecord>,
) {
    for backend in &options.remote_backends {
        let client = RemoteClient::new(backend.clone(), "cli-user", ulid::Ulid::new().to_string());
        let agents = match client.list_agents().await {
            Ok(agents) => agents,
            Err(err) => {
                warn!(backend, error = %err, "remote agent listing failed");
                continue;
            }
        };

        for agent in agents {
            insert(
                agent.name.clone(),
                agent.clone(),
                SourceRecord {
                    source_type: AgentSourceType::Remote,
                    location: backend.clone(),
                    agents_dir: None,
                },
                by_name,
                ordered_names,
                index,
            );
        }
    }
}

/// Precedence: local beats remote/plugin; plugin never beats local/remote;
/// remote never beats anything once present; first-seen wins within a
/// phase.
fn insert(
    name: String,
    info: AgentInfo,
    record: SourceRecord,
    by_name: &mut HashMap<String, AgentInfo>,
    ordered_names: &mut Vec<String>,
    index: &mut HashMap<String, SourceRecord>,
) {
    match by_name.get(&name) {
        None => {
            ordered_names.push(name.clone());
            by_name.insert(name.clone(), info);
            index.insert(name, record);
        }
        Some(existing) => {
            let should_replace = matches!(
                (existing.source_type, record.source_type),
                (AgentSourceType::Remote | AgentSourceType::Plugin, AgentSourceType::Local)
            );
            if should_replace {
                by_name.insert(name.clone(), info);
                index.insert(name, record);
            }
        }
    }
}

fn resolve_local_dirs(options: &LoadOptions) -> Vec<PathBuf> {
    if !options.local_agent_dirs.is_empty() && options.local_agent_dirs != vec![PathBuf::from("./agents")] {
        return options.local_agent_dirs.clone();
    }

    for var in ["LOCAL_AGENTS_DIR", "AGENTS_DIR"] {
        if let Ok(raw) = std::env::var(var) {
            let dirs: Vec<PathBuf> = raw.split(';').filter(|s| !s.is_empty()).map(PathBuf::from).collect();
            if !dirs.is_empty() {
                return dirs;
            }
        }
    }

    vec![PathBuf::from("./agents")]
}

fn has_skill_md(dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries.flatten().any(|entry| {
        entry.path().is_dir()
            && std::fs::read_dir(entry.path())
                .map(|mut sub| sub.any(|f| matches!(f.ok().and_then(|f| f.file_name().into_string().ok()).as_deref(), Some("SKILL.md") | Some("skill.md"))))
                .unwrap_or(false)
    })
}

fn markdown_files(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    walk_markdown(dir, &mut found);
    found
}

fn walk_markdown(dir: &Path, found: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_markdown(&path, found);
        } else if path.extension().and_then(|e| e.to_str()) == Some("md") {
            found.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aworld_cache::CacheManager;
    use aworld_core::SkillConflictPolicy;
    use tempfile::tempdir;

    fn registry_and_skills(root: &Path) -> (AgentRegistry, SkillRegistry) {
        (
            AgentRegistry::new(),
            SkillRegistry::new(CacheManager::new(root.join("cache")), SkillConflictPolicy::KeepFirst),
        )
    }

    #[tokio::test]
    async fn local_phase_discovers_markdown_agents() {
        let dir = tempdir().unwrap();
        let agents_dir = dir.path().join("agents");
        std::fs::create_dir_all(&agents_dir).unwrap();
        std::fs::write(agents_dir.join("weather.md"), "---\nname: weather\n---\n").unwrap();

        let (registry, mut skills) = registry_and_skills(dir.path());
        let options = LoadOptions {
            local_agent_dirs: vec![agents_dir.clone()],
            ..Default::default()
        };

        let report = load(&options, &registry, &mut skills).await;
        assert_eq!(report.agents.len(), 1);
        assert_eq!(report.agents[0].source_type, AgentSourceType::Local);
    }

    #[test]
    fn local_wins_over_remote_in_precedence_merge() {
        let mut by_name = HashMap::new();
        let mut ordered = Vec::new();
        let mut index = HashMap::new();

        let remote_info = AgentInfo {
            name: "weather".into(),
            description: "remote desc".into(),
            source_type: AgentSourceType::Remote,
            source_location: "http://backend".into(),
            metadata: HashMap::new(),
        };
        insert(
            "weather".into(),
            remote_info,
            SourceRecord { source_type: AgentSourceType::Remote, location: "http://backend".into(), agents_dir: None },
            &mut by_name,
            &mut ordered,
            &mut index,
        );

        let local_info = AgentInfo {
            name: "weather".into(),
            description: "local desc".into(),
            source_type: AgentSourceType::Local,
            source_location: "./agents".into(),
            metadata: HashMap::new(),
        };
        insert(
            "weather".into(),
            local_info,
            SourceRecord { source_type: AgentSourceType::Local, location: "./agents".into(), agents_dir: None },
            &mut by_name,
            &mut ordered,
            &mut index,
        );

        assert_eq!(by_name.get("weather").unwrap().source_type, AgentSourceType::Local);
        assert_eq!(ordered.len(), 1);
    }

    #[test]
    fn remote_never_overrides_existing_entry() {
        let mut by_name = HashMap::new();
        let mut ordered = Vec::new();
        let mut index = HashMap::new();

        let local_info = AgentInfo {
            name: "weather".into(),
            description: "local desc".into(),
            source_type: AgentSourceType::Local,
            source_location: "./agents".into(),
            metadata: HashMap::new(),
        };
        insert(
            "weather".into(),
            local_info,
            SourceRecord { source_type: AgentSourceType::Local, location: "./agents".into(), agents_dir: None },
            &mut by_name,
            &mut ordered,
            &mut index,
        );

        let remote_info = AgentInfo {
            name: "weather".into(),
            description: "remote desc".into(),
            source_type: AgentSourceType::Remote,
            source_location: "http://backend".into(),
            metadata: HashMap::new(),
        };
        insert(
            "weather".into(),
            remote_info,
            SourceRecord { source_type: AgentSourceType::Remote, location: "http://backend".into(), agents_dir: None },
            &mut by_name,
            &mut ordered,
            &mut index,
        );

        assert_eq!(by_name.get("weather").unwrap().source_type, AgentSourceType::Local);
    }
}
