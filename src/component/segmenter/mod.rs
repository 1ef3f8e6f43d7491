//! Size-driven video splitting

mod bitrate;
mod main;

pub use bitrate::{effective_bit_rate, expected_segment_count, needs_split, segment_seconds};
pub use main::{SegmentPlan, Segmenter};
