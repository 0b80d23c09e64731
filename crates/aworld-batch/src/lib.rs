pub mod config;
pub mod csv_io;
pub mod digest;
pub mod error;
pub mod run;

pub use config::{AgentConfig, BatchConfig, DigestLogConfig, ExecutionConfig, InputConfig, OutputConfig};
pub use error::{BatchError, Result};
pub use run::{run, BatchSummary};
