pub mod loader;
pub mod markdown;
pub mod module_loader;
pub mod registry;

pub use loader::{load, LoadOptions, LoadReport, SourceRecord};
pub use markdown::parse_markdown_agent;
pub use module_loader::{discover_modules, load_all, load_module, REGISTRATION_SYMBOL};
pub use registry::{derive_version_from_dir_name, AgentRegistry};
