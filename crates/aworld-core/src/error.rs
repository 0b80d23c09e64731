#[derive(thiserror::Error, Debug)]
pub enum AgentError {
    #[error("agent '{0}' not found")]
    NotFound(String),

    #[error("agent name must not be empty")]
    EmptyName,

    #[error("invalid version '{0}': expected 'v<N>'")]
    InvalidVersion(String),

    #[error("duplicate agent '{0}' within a single registration batch")]
    DuplicateInBatch(String),

    #[error("agent '{0}' collides with an existing registration")]
    Collision(String),

    #[error("swarm builder for '{0}' failed: {1}")]
    BuilderFailed(String, String),

    #[error("front matter parse error in {path}: {message}")]
    FrontMatter { path: String, message: String },

    #[error("agent module load error in {path}: {message}")]
    ModuleLoad { path: String, message: String },
}

#[derive(thiserror::Error, Debug)]
pub enum SkillError {
    #[error("skill source '{0}' is not registered")]
    UnknownSource(String),

    #[error("skill name collision: '{0}' already registered by source '{1}'")]
    Collision(String, String),

    #[error("skill '{0}' not found")]
    NotFound(String),

    #[error("invalid regex pattern '{0}': {1}")]
    InvalidRegex(String, String),
}

pub type Result<T, E = AgentError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_not_found() {
        let err = AgentError::NotFound("foo".into());
        assert_eq!(err.to_string(), "agent 'foo' not found");
    }

    #[test]
    fn test_display_invalid_version() {
        let err = AgentError::InvalidVersion("1".into());
        assert_eq!(err.to_string(), "invalid version '1': expected 'v<N>'");
    }

    #[test]
    fn test_skill_collision_display() {
        let err = SkillError::Collision("ctx-a".into(), "local".into());
        assert_eq!(
            err.to_string(),
            "skill name collision: 'ctx-a' already registered by source 'local'"
        );
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AgentError>();
        assert_send_sync::<SkillError>();
    }
}
