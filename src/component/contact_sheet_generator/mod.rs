//! Preview image: evenly sampled frames laid out on a fixed grid

mod contact_sheet_merger;
mod frame_sampler;
mod main;

pub use contact_sheet_merger::{
    CELL_WIDTH, GridLayout, JPEG_QUALITY, MIN_CELL_HEIGHT, create_contact_sheet,
};
pub use frame_sampler::{extract_frames, frame_path, sample_timestamps};
pub use main::{ThumbnailComposer, ThumbnailGrid, preview_path};
