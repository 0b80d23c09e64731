pub mod error;
pub mod executor;
pub mod hooks;

pub use error::{ExecutorError, Result};
pub use executor::{ContextConfig, Executor, LocalExecutor, RemoteExecutor};
pub use hooks::{global_registry, FileParseHook, Hook, HookPoint, HookRegistry};
