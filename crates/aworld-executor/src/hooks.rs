//! Process-wide hook registry, grouped by hook point. Hook names attached to
//! an `AgentDescriptor` are resolved here at invocation time rather than
//! carried as closures on the descriptor itself.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    PreInputParse,
    PostInputParse,
    PreBuildContext,
    PostBuildContext,
    PreBuildTask,
    PostBuildTask,
    PreRunTask,
    PostRunTask,
    OnTaskError,
}

/// A named hook. `run` receives the current text payload (input, task
/// output, or error message depending on the hook point) and returns a
/// possibly-transformed payload.
#[async_trait]
pub trait Hook: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self, payload: String) -> anyhow::Result<String>;
}

/// Always registered at `post_input_parse`: resolves `@<path>` references in
/// the raw input text before it reaches the agent.
pub struct FileParseHook;

#[async_trait]
impl Hook for FileParseHook {
    fn name(&self) -> &str {
        "FileParseHook"
    }

    async fn run(&self, payload: String) -> anyhow::Result<String> {
        let (text, _images) = aworld_remote::resolve_file_references(&payload);
        Ok(text)
    }
}

pub struct HookRegistry {
    by_point: RwLock<HashMap<HookPoint, Vec<Arc<dyn Hook>>>>,
}

impl Default for HookRegistry {
    fn default() -> Self {
        let mut by_point: HashMap<HookPoint, Vec<Arc<dyn Hook>>> = HashMap::new();
        by_point.insert(HookPoint::PostInputParse, vec![Arc::new(FileParseHook)]);
        Self {
            by_point: RwLock::new(by_point),
        }
    }
}

impl HookRegistry {
    pub fn register(&self, point: HookPoint, hook: Arc<dyn Hook>) {
        self.by_point.write().unwrap().entry(point).or_default().push(hook);
    }

    /// Hooks at `point` whose name is in `names`, in registration order.
    /// `FileParseHook` is always included at `PostInputParse` regardless of
    /// whether its name appears in `names`.
    pub fn resolve(&self, point: HookPoint, names: &[String]) -> Vec<Arc<dyn Hook>> {
        let guard = self.by_point.read().unwrap();
        let Some(hooks) = guard.get(&point) else {
            return Vec::new();
        };
        hooks
            .iter()
            .filter(|hook| point == HookPoint::PostInputParse && hook.name() == "FileParseHook" || names.iter().any(|n| n == hook.name()))
            .cloned()
            .collect()
    }
}

static REGISTRY: OnceLock<HookRegistry> = OnceLock::new();

pub fn global_registry() -> &'static HookRegistry {
    REGISTRY.get_or_init(HookRegistry::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UppercaseHook;

    #[async_trait]
    impl Hook for UppercaseHook {
        fn name(&self) -> &str {
            "UppercaseHook"
        }

        async fn run(&self, payload: String) -> anyhow::Result<String> {
            Ok(payload.to_uppercase())
        }
    }

    #[test]
    fn file_parse_hook_always_present_at_post_input_parse() {
        let registry = HookRegistry::default();
        let resolved = registry.resolve(HookPoint::PostInputParse, &[]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name(), "FileParseHook");
    }

    #[test]
    fn named_hook_resolved_by_point_and_name() {
        let registry = HookRegistry::default();
        registry.register(HookPoint::PreRunTask, Arc::new(UppercaseHook));

        assert!(registry.resolve(HookPoint::PreRunTask, &[]).is_empty());
        let resolved = registry.resolve(HookPoint::PreRunTask, &["UppercaseHook".to_string()]);
        assert_eq!(resolved.len(), 1);
    }

    #[tokio::test]
    async fn uppercase_hook_transforms_payload() {
        let hook = UppercaseHook;
        let out = hook.run("hi".to_string()).await.unwrap();
        assert_eq!(out, "HI");
    }
}
