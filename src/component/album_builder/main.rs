use super::media_item::{AlbumRequest, MAX_ALBUM_ITEMS, MediaItem};
use crate::component::contact_sheet_generator::ThumbnailGrid;
use crate::component::segmenter::SegmentPlan;
use crate::error::PipelineError;
use crate::tools::{MediaKind, VideoProbe};
use log::debug;

/// Turns a preview and a segment plan into an album: preview first with the
/// caption, then every segment in plan order without one.
pub struct AlbumBuilder;

impl AlbumBuilder {
    /// Preview plus `segments` must fit in one album.
    pub fn ensure_fits(segments: usize) -> Result<(), PipelineError> {
        let items = 1 + segments;
        if items > MAX_ALBUM_ITEMS {
            return Err(PipelineError::AlbumTooLarge {
                items,
                segments,
                limit: MAX_ALBUM_ITEMS,
            });
        }
        Ok(())
    }

    /// Fails with [`PipelineError::AlbumTooLarge`] before anything is uploaded.
    pub fn build(
        grid: &ThumbnailGrid,
        caption: &str,
        plan: &SegmentPlan,
        probe: &VideoProbe,
    ) -> Result<AlbumRequest, PipelineError> {
        Self::ensure_fits(plan.len())?;
        let total = 1 + plan.len();

        let mut items = Vec::with_capacity(total);
        items.push(
            MediaItem::new(&grid.path, MediaKind::Photo, caption)
                .with_dimensions(grid.width, grid.height),
        );
        items.extend(plan.segments().iter().map(|segment| {
            MediaItem::new(segment, MediaKind::Video, "").with_dimensions(probe.width, probe.height)
        }));

        debug!("Album with {total} items: {caption}");
        AlbumRequest::new(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn grid() -> ThumbnailGrid {
        ThumbnailGrid {
            path: PathBuf::from("/w/trip_alps_preview.jpg"),
            width: 1600,
            height: 1080,
            frame_count: 30,
            columns: 5,
            rows: 6,
        }
    }

    const PROBE: VideoProbe = VideoProbe {
        duration_seconds: 650.0,
        bit_rate: 0,
        width: 1920,
        height: 1080,
    };

    fn plan(count: usize) -> SegmentPlan {
        SegmentPlan::from_segments(
            (0..count)
                .map(|i| PathBuf::from(format!("/w/trip_alps_part{i:03}.mp4")))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_preview_then_segments_in_order() {
        let album = AlbumBuilder::build(&grid(), "#trip alps", &plan(4), &PROBE).unwrap();

        assert_eq!(album.len(), 5);
        let first = &album.items()[0];
        assert_eq!(first.kind, MediaKind::Photo);
        assert_eq!(first.caption, "#trip alps");
        assert_eq!((first.width, first.height), (Some(1600), Some(1080)));

        for (index, item) in album.items()[1..].iter().enumerate() {
            assert_eq!(item.kind, MediaKind::Video);
            assert!(item.caption.is_empty());
            assert_eq!(item.path, PathBuf::from(format!("/w/trip_alps_part{index:03}.mp4")));
            assert_eq!(item.width, Some(1920));
        }
    }

    #[test]
    fn test_unsplit_video_still_gets_preview() {
        let plan = SegmentPlan::unsplit(Path::new("/in/trip_alps.mp4"));
        let album = AlbumBuilder::build(&grid(), "#trip alps", &plan, &PROBE).unwrap();

        assert_eq!(album.len(), 2);
        assert_eq!(album.items()[1].path, PathBuf::from("/in/trip_alps.mp4"));
    }

    #[test]
    fn test_thirteen_segments_too_large() {
        let err = AlbumBuilder::build(&grid(), "#trip alps", &plan(13), &PROBE).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::AlbumTooLarge {
                items: 14,
                segments: 13,
                limit: 10
            }
        ));
    }

    #[test]
    fn test_ensure_fits() {
        assert!(AlbumBuilder::ensure_fits(9).is_ok());
        assert_eq!(AlbumBuilder::ensure_fits(10).unwrap_err().kind(), "AlbumTooLarge");
    }

    #[test]
    fn test_nine_segments_fill_album() {
        let album = AlbumBuilder::build(&grid(), "#trip alps", &plan(9), &PROBE).unwrap();
        assert_eq!(album.len(), MAX_ALBUM_ITEMS);
    }
}
