pub mod client;
pub mod error;
mod fileref;
pub mod sse;

pub use client::RemoteClient;
pub use error::{RemoteError, Result};
pub use fileref::{build_content, resolve_file_references};
pub use sse::{Accumulator, StreamEvent};
