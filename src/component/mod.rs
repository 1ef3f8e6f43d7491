//! Pipeline stages
//!
//! Each submodule is one step of turning a source file into a delivered message;
//! `batch_uploader` strings them together.

pub mod album_builder;
pub mod batch_uploader;
pub mod contact_sheet_generator;
pub mod file_relocator;
pub mod segmenter;
pub mod uploader;

pub use album_builder::AlbumBuilder;
pub use batch_uploader::BatchUploader;
pub use contact_sheet_generator::ThumbnailComposer;
pub use file_relocator::FileRelocator;
pub use segmenter::Segmenter;
pub use uploader::UploadOrchestrator;
