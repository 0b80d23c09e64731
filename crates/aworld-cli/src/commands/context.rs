use crate::cli::Cli;
use anyhow::Result;
use aworld_agents::{loader, AgentRegistry};
use aworld_core::AgentInfo;
use aworld_skills::SkillRegistry;
use std::path::PathBuf;
use std::sync::Arc;

pub struct LoadedContext {
    pub registry: Arc<AgentRegistry>,
    pub skills: SkillRegistry,
    pub agents: Vec<AgentInfo>,
}

/// Build the registries and run C6's three-phase load according to the
/// global CLI flags.
pub async fn load(cli: &Cli) -> Result<LoadedContext> {
    let extra_skill_paths: Vec<PathBuf> = cli.skill_path.iter().map(PathBuf::from).collect();
    let mut skills = aworld_skills::bootstrap(&extra_skill_paths)?;

    let registry = Arc::new(AgentRegistry::new());
    let options = loader::LoadOptions {
        local_agent_dirs: if cli.agent_dir.is_empty() {
            vec![PathBuf::from("./agents")]
        } else {
            cli.agent_dir.iter().map(PathBuf::from).collect()
        },
        remote_backends: resolve_remote_backends(cli),
        plugin_root: None,
    };

    let report = loader::load(&options, &registry, &mut skills).await;

    for file in &cli.agent_file {
        if let Some(descriptor) = aworld_agents::parse_markdown_agent(std::path::Path::new(file), &mut skills) {
            registry.register(descriptor);
        }
    }

    Ok(LoadedContext {
        registry,
        skills,
        agents: report.agents,
    })
}

fn resolve_remote_backends(cli: &Cli) -> Vec<String> {
    if !cli.remote_backend.is_empty() {
        return cli.remote_backend.clone();
    }
    for var in ["REMOTE_AGENT_BACKEND", "REMOTE_AGENTS_BACKEND"] {
        if let Ok(raw) = std::env::var(var) {
            if !raw.is_empty() {
                return raw.split(',').map(str::to_string).collect();
            }
        }
    }
    Vec::new()
}

fn history() -> Option<aworld_session::SessionHistory> {
    aworld_session::SessionHistory::default_path().ok().map(aworld_session::SessionHistory::new)
}

/// `--session-id <id>` pins an id outright; `--session-id restore` (or
/// `latest`) re-adopts the most recently recorded one; anything else
/// generates a fresh id, matching `/new`.
pub fn session_id(cli: &Cli) -> String {
    match cli.session_id.as_deref() {
        Some("restore") | Some("latest") => history()
            .and_then(|h| h.latest())
            .unwrap_or_else(aworld_session::SessionHistory::generate_id),
        Some(id) => id.to_string(),
        None => aworld_session::SessionHistory::generate_id(),
    }
}

/// Record `session_id` into the local history after a successful run, so a
/// later `--session-id restore` can re-adopt it. Best-effort: a history
/// write failure must not fail the command that already succeeded.
pub fn record_session(session_id: &str) {
    if let Some(h) = history() {
        if let Err(err) = h.record(session_id) {
            tracing::warn!(error = %err, "failed to record session id");
        }
    }
}
