//! C3: hand-rolled parser for `skill.md`-shaped agent definitions — a
//! front-matter block (parsed by [`aworld_core::parse_front_matter`]) plus a
//! markdown body that becomes (part of) the agent's system prompt.

use aworld_core::{AgentDescriptor, FixedSwarm, Metadata, Swarm};
use aworld_skills::SkillRegistry;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI agent.";

/// Parse one agent markdown file, best-effort: any stage that fails to
/// resolve just logs and leaves the corresponding field empty/absent, per
/// the "never fatal for the caller" contract. Returns `None` only when the
/// required `name` field is missing.
pub fn parse_markdown_agent(path: &Path, skills: &mut SkillRegistry) -> Option<AgentDescriptor> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read agent markdown file");
            return None;
        }
    };

    let fm = aworld_core::parse_front_matter(&content);
    let name = match fm.get_str("name") {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => {
            warn!(path = %path.display(), "agent markdown missing required 'name' field");
            return None;
        }
    };

    let markdown_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let description = fm
        .get_str("description")
        .or_else(|| fm.get_str("desc"))
        .unwrap_or("")
        .to_string();

    let tool_list = parse_tool_list(fm.fields.get("tool_list"));
    let tool_names: Vec<String> = tool_list.keys().cloned().collect();

    let mut mcp_servers = normalize_list(fm.fields.get("mcp_servers"));
    let mcp_config = resolve_mcp_config(fm.fields.get("mcp_config"), markdown_dir);
    if mcp_servers.is_empty() {
        if let Some(servers) = mcp_config.as_ref().and_then(|c| c.get("mcpServers")).and_then(Value::as_object) {
            mcp_servers = servers.keys().cloned().collect();
        }
    }

    let ptc_tools = normalize_list(fm.fields.get("ptc_tools"));

    // Best-effort auto-registration of the sibling skills directory,
    // ahead of any explicit skills_path entries.
    if let Some(parent) = markdown_dir.parent() {
        let sibling_skills = parent.join("skills");
        if sibling_skills.is_dir() {
            if let Some(s) = sibling_skills.to_str() {
                let _ = skills.register_source(s, None, false);
            }
        }
    }

    if let Some(raw) = fm.get_str("skills_path") {
        for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let resolved = resolve_relative(markdown_dir, entry);
            if let Some(s) = resolved.to_str() {
                if skills.register_source(s, None, false).is_err() {
                    warn!(path = %resolved.display(), "failed to register skills_path entry");
                }
            }
        }
    }

    let mut resolved_skill_names = Vec::new();
    if let Some(raw) = fm.get_str("skill_names") {
        for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            if let Some(pattern) = entry.strip_prefix("regex:") {
                match skills.get_by_regex(pattern, "name", false) {
                    Ok(matches) => resolved_skill_names.extend(matches.into_iter().map(|s| s.name.clone())),
                    Err(err) => warn!(pattern, error = %err, "invalid skill_names regex"),
                }
            } else if skills.get(entry).is_some() {
                resolved_skill_names.push(entry.to_string());
            } else {
                warn!(name = entry, "skill_names entry not found in registry");
            }
        }
    }

    let body = content.lines().skip(fm.body_start_line).collect::<Vec<_>>().join("\n");
    let system_prompt = build_system_prompt(&description, &body);

    let mut metadata: Metadata = HashMap::new();
    metadata.insert("system_prompt".to_string(), Value::String(system_prompt));
    metadata.insert("tool_list".to_string(), serde_json::to_value(&tool_list).unwrap_or(Value::Null));
    metadata.insert("tool_names".to_string(), serde_json::to_value(&tool_names).unwrap_or(Value::Null));
    metadata.insert("mcp_servers".to_string(), serde_json::to_value(&mcp_servers).unwrap_or(Value::Null));
    if let Some(cfg) = mcp_config {
        metadata.insert("mcp_config".to_string(), cfg);
    }
    metadata.insert("ptc_tools".to_string(), serde_json::to_value(&ptc_tools).unwrap_or(Value::Null));
    metadata.insert(
        "skill_names".to_string(),
        serde_json::to_value(&resolved_skill_names).unwrap_or(Value::Null),
    );
    let skill_configs: HashMap<String, _> = skills
        .get_skill_configs()
        .into_iter()
        .filter(|(name, _)| resolved_skill_names.contains(name))
        .collect();
    metadata.insert("skill_configs".to_string(), serde_json::to_value(&skill_configs).unwrap_or(Value::Null));
    metadata.insert("source".to_string(), Value::String("markdown".to_string()));
    metadata.insert("file_path".to_string(), Value::String(path.display().to_string()));

    let version = markdown_dir
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(crate::registry::derive_version_from_dir_name);

    Some(AgentDescriptor {
        name: name.clone(),
        description,
        version,
        builder: Arc::new(FixedSwarm(Swarm { root_agent: name })),
        hooks: Vec::new(),
        register_dir: Some(markdown_dir.to_path_buf()),
        source_file: Some(path.to_path_buf()),
        metadata,
    })
}

fn build_system_prompt(description: &str, body: &str) -> String {
    let trimmed_body = body.trim();
    match (description.trim().is_empty(), trimmed_body.is_empty()) {
        (true, true) => DEFAULT_SYSTEM_PROMPT.to_string(),
        (true, false) => trimmed_body.to_string(),
        (false, true) => description.trim().to_string(),
        (false, false) => format!("{}\n\n{}", description.trim(), trimmed_body),
    }
}

fn parse_tool_list(value: Option<&Value>) -> HashMap<String, Vec<String>> {
    value
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(server, tools)| {
                    let list = tools
                        .as_array()
                        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
                        .unwrap_or_default();
                    (server.clone(), list)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Accepts a JSON array, a comma-separated scalar, or a bare scalar and
/// normalizes to a list of strings.
fn normalize_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(|v| v.as_str().map(String::from)).collect(),
        Some(Value::String(s)) if s.contains(',') => s.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn resolve_relative(base: &Path, entry: &str) -> PathBuf {
    let candidate = Path::new(entry);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    }
}

/// Three-step cascade: inline JSON, else a `.json` file path relative to
/// the markdown file's directory, else discard with a warning. Loading a
/// non-JSON config module that executes arbitrary code is intentionally
/// not supported.
fn resolve_mcp_config(raw: Option<&Value>, markdown_dir: &Path) -> Option<Value> {
    let raw = raw?;
    if raw.is_object() || raw.is_array() {
        return Some(raw.clone());
    }

    let s = raw.as_str()?;
    if let Ok(parsed) = serde_json::from_str::<Value>(s) {
        return Some(parsed);
    }

    if s.contains(".json") || s.contains('/') || s.contains('\\') {
        let path = resolve_relative(markdown_dir, s);
        return match std::fs::read_to_string(&path).ok().and_then(|c| serde_json::from_str(&c).ok()) {
            Some(parsed) => Some(parsed),
            None => {
                warn!(path = %path.display(), "failed to load mcp_config file");
                None
            }
        };
    }

    warn!(value = s, "mcp_config is neither inline JSON nor a file path, discarding");
    None
}
