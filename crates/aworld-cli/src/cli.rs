use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "aworld", version, about = "Multi-source LLM agent orchestrator and batch runner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Additional local agent directory to scan (repeatable)
    #[arg(long = "agent-dir", global = true)]
    pub agent_dir: Vec<String>,

    /// Load a single agent definition file directly (repeatable)
    #[arg(long = "agent-file", global = true)]
    pub agent_file: Vec<String>,

    /// Remote agent backend base URL (repeatable)
    #[arg(long = "remote-backend", global = true)]
    pub remote_backend: Vec<String>,

    /// Additional skill source to register (repeatable)
    #[arg(long = "skill-path", global = true)]
    pub skill_path: Vec<String>,

    /// Pin the session id instead of generating a fresh one. Pass `restore`
    /// (or `latest`) to re-adopt the most recently recorded session instead.
    #[arg(long = "session-id", global = true)]
    pub session_id: Option<String>,

    /// Tracing log level (trace, debug, info, warn, error)
    #[arg(long = "log-level", global = true, default_value = "info")]
    pub log_level: String,

    /// Tracing output format
    #[arg(long = "log-format", global = true, default_value = "pretty")]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load agents from every configured source and print them as a table
    List,

    /// Run a batch job from a YAML config
    #[command(alias = "batch")]
    BatchJob {
        /// Path to the batch job YAML file
        config: String,
    },

    /// Run a single task against one agent
    Task {
        /// Agent name to dispatch to
        #[arg(long)]
        agent: String,

        /// Prompt text
        prompt: String,
    },

    /// Plugin management
    Plugin {
        #[command(subcommand)]
        command: PluginCommands,
    },

    /// Skill registry inspection
    Skill {
        #[command(subcommand)]
        command: SkillCommands,
    },
}

#[derive(Subcommand)]
pub enum PluginCommands {
    /// Install a plugin from a GitHub reference or local path
    Install {
        name: String,
        source: String,
        #[arg(long)]
        force: bool,
    },
    /// List installed plugins
    List,
    /// Remove an installed plugin
    Remove { name: String },
}

#[derive(Subcommand)]
pub enum SkillCommands {
    /// List every registered skill
    List,
    /// Search skills by keyword
    Search {
        keyword: String,
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },
}
