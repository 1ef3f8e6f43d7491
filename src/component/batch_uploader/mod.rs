//! Sequential driver over the source directory

mod main;
mod summary;

pub use main::{BatchUploader, DeliveryResult, describe_settings};
pub use summary::{BatchSummary, FileFailure};
