use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Free-form metadata attached to an agent descriptor. Well-known keys
/// (`version`, `source`, `file_path`, `tool_list`, `mcp_servers`,
/// `mcp_config`, `ptc_tools`, `skills_path`, `skill_names`, `skill_configs`)
/// are documented by the components that populate them.
pub type Metadata = HashMap<String, serde_json::Value>;

/// Context passed to a swarm builder that declares it needs one.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    pub user_id: String,
    pub session_id: String,
    pub task_id: String,
}

impl BuildContext {
    pub fn synthetic() -> Self {
        let stamp = std::process::id();
        Self {
            user_id: "cli-user".to_string(),
            session_id: format!("synthetic-session-{stamp}"),
            task_id: format!("synthetic-task-{stamp}"),
        }
    }
}

/// The runnable execution graph an agent expands into. Opaque to this crate;
/// the actual agent runtime is an external collaborator.
#[derive(Debug, Clone)]
pub struct Swarm {
    pub root_agent: String,
}

/// Translates the decorator-time side effect of the original loader into an
/// explicit, callable unit: given an optional context, produce a `Swarm`.
#[async_trait]
pub trait SwarmBuilder: Send + Sync {
    async fn build(&self, ctx: Option<&BuildContext>) -> anyhow::Result<Swarm>;
}

/// A builder that already carries a fully-built swarm (the bare-decorator
/// form, which registers a finished descriptor rather than a closure).
pub struct FixedSwarm(pub Swarm);

#[async_trait]
impl SwarmBuilder for FixedSwarm {
    async fn build(&self, _ctx: Option<&BuildContext>) -> anyhow::Result<Swarm> {
        Ok(self.0.clone())
    }
}

/// Record registered into the agent registry. Immutable once constructed;
/// `register-dir`/`source-file` are set by whichever loader produced it.
#[derive(Clone)]
pub struct AgentDescriptor {
    pub name: String,
    pub description: String,
    pub version: Option<String>,
    pub builder: Arc<dyn SwarmBuilder>,
    pub hooks: Vec<String>,
    pub register_dir: Option<PathBuf>,
    pub source_file: Option<PathBuf>,
    pub metadata: Metadata,
}

impl std::fmt::Debug for AgentDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentDescriptor")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("register_dir", &self.register_dir)
            .field("source_file", &self.source_file)
            .finish_non_exhaustive()
    }
}

impl AgentDescriptor {
    /// Key used by the registry: `name` alone, or `name:version` when a
    /// version is present.
    pub fn registry_key(&self) -> String {
        match &self.version {
            Some(v) => format!("{}:{v}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Where an `AgentInfo` was sourced from in the multi-source loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentSourceType {
    Local,
    Plugin,
    Remote,
}

impl std::fmt::Display for AgentSourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Plugin => write!(f, "plugin"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Thin, serializable view over a descriptor surfaced by the multi-source
/// loader (the `list` command operates on this, not on the full descriptor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInfo {
    pub name: String,
    pub description: String,
    pub source_type: AgentSourceType,
    pub source_location: String,
    pub metadata: Metadata,
}

/// Token/cost accounting surfaced by a backend response, in whatever shape
/// it reported. Any field may be absent; the batch executor's extraction
/// cascade (SPEC_FULL.md §4.9 step 6) fills in what it can from this.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
    pub cost: Option<f64>,
}

/// What a single `chat` call produced: the response text, plus whatever
/// usage accounting the transport could surface alongside it.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub text: String,
    pub usage: Option<Usage>,
}

/// A catalogued skill: a `skill.md`/`SKILL.md` document plus metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillEntry {
    pub name: String,
    pub description: String,
    pub usage: String,
    pub skill_type: String,
    pub active: bool,
    pub tool_list: HashMap<String, Vec<String>>,
    pub source_path: PathBuf,
}

impl SkillEntry {
    pub fn is_agentic(&self) -> bool {
        self.skill_type == "agent"
    }
}

/// Policy applied when two sources contribute a skill with the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkillConflictPolicy {
    #[default]
    KeepFirst,
    KeepLast,
    Raise,
}

/// A registered skill source: a resolved local directory plus the skills it
/// contributed, tracked so unregistration only removes what it owns.
#[derive(Debug, Clone)]
pub struct SkillSource {
    pub source_key: String,
    /// The raw, unresolved reference this source was registered with (a git
    /// URL, shorthand, or local path) — kept alongside `resolved_path` so a
    /// later cache refresh can re-derive repo info and re-trigger a
    /// clone/fetch instead of just re-walking the stale checkout.
    pub reference: String,
    pub resolved_path: PathBuf,
    pub skill_names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, version: Option<&str>) -> AgentDescriptor {
        AgentDescriptor {
            name: name.to_string(),
            description: String::new(),
            version: version.map(|v| v.to_string()),
            builder: Arc::new(FixedSwarm(Swarm {
                root_agent: name.to_string(),
            })),
            hooks: Vec::new(),
            register_dir: None,
            source_file: None,
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn registry_key_without_version() {
        assert_eq!(descriptor("foo", None).registry_key(), "foo");
    }

    #[test]
    fn registry_key_with_version() {
        assert_eq!(descriptor("foo", Some("v2")).registry_key(), "foo:v2");
    }

    #[test]
    fn agentic_skill_detection() {
        let skill = SkillEntry {
            name: "x".into(),
            description: String::new(),
            usage: String::new(),
            skill_type: "agent".into(),
            active: true,
            tool_list: HashMap::new(),
            source_path: PathBuf::new(),
        };
        assert!(skill.is_agentic());
    }

    #[tokio::test]
    async fn fixed_swarm_returns_same_swarm() {
        let fixed = FixedSwarm(Swarm {
            root_agent: "a".into(),
        });
        let swarm = fixed.build(None).await.unwrap();
        assert_eq!(swarm.root_agent, "a");
    }
}
