pub mod error;
pub mod front_matter;
pub mod types;

pub use error::{AgentError, Result, SkillError};
pub use front_matter::{parse as parse_front_matter, FrontMatter};
pub use types::{
    AgentDescriptor, AgentInfo, AgentSourceType, BuildContext, ChatResponse, FixedSwarm, Metadata,
    SkillConflictPolicy, SkillEntry, SkillSource, Swarm, SwarmBuilder, Usage,
};
