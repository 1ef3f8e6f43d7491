mod main;
mod media_item;

pub use main::AlbumBuilder;
pub use media_item::{AlbumRequest, MAX_ALBUM_ITEMS, MediaItem};
