pub mod component;
pub mod config;
pub mod context;
pub mod error;
pub mod init;
pub mod signal;
pub mod tools;

pub use context::PipelineContext;
pub use error::PipelineError;
