mod main;

pub use main::{FileRelocator, RelocationReport, done_file_name};
