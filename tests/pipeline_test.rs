//! End-to-end runs of the batch with an in-memory transcoder and transport.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use album_uploader::PipelineContext;
use album_uploader::component::BatchUploader;
use album_uploader::component::uploader::{
    DeliveryId, Destination, ItemProgress, MessagingTransport, OutgoingMedia, TransportHandle,
};
use album_uploader::config::{Config, UserSettings};
use album_uploader::tools::{MediaKind, Transcoder};
use anyhow::{Result, bail};
use image::{Rgb, RgbImage};
use tempfile::TempDir;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Probe,
    Segment,
    Frame,
}

/// Reports a fixed duration and cuts `ceil(duration / secs)` placeholder parts.
struct FakeTranscoder {
    duration: f64,
    fail_at: Option<Stage>,
}

impl FakeTranscoder {
    fn new(duration: f64) -> Self {
        Self {
            duration,
            fail_at: None,
        }
    }

    fn failing_at(duration: f64, stage: Stage) -> Self {
        Self {
            duration,
            fail_at: Some(stage),
        }
    }
}

impl Transcoder for FakeTranscoder {
    fn duration(&self, _video: &Path) -> Result<f64> {
        if self.fail_at == Some(Stage::Probe) {
            bail!("moov atom not found");
        }
        Ok(self.duration)
    }

    fn bit_rate(&self, _video: &Path) -> Result<u64> {
        Ok(0)
    }

    fn resolution(&self, _video: &Path) -> Result<(u32, u32)> {
        Ok((1280, 720))
    }

    fn extract_frame(&self, _video: &Path, timestamp: f64, output: &Path) -> Result<PathBuf> {
        if self.fail_at == Some(Stage::Frame) && timestamp > 0.0 {
            bail!("decoder error at {timestamp}");
        }
        RgbImage::from_pixel(64, 36, Rgb([200, 100, 50])).save(output)?;
        Ok(output.to_path_buf())
    }

    fn segment(&self, video: &Path, secs: u64, work_dir: &Path) -> Result<Vec<PathBuf>> {
        if self.fail_at == Some(Stage::Segment) {
            fs::write(work_dir.join("partial.ts"), b"partial")?;
            bail!("segment muxer failed");
        }
        let stem = video.file_stem().unwrap().to_string_lossy().into_owned();
        let count = (self.duration / secs as f64).ceil() as usize;
        (0..count)
            .map(|i| {
                let path = work_dir.join(format!("{stem}_part{i:03}.mp4"));
                fs::write(&path, b"segment")?;
                Ok::<_, anyhow::Error>(path)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SentMessage {
    names: Vec<String>,
    kinds: Vec<MediaKind>,
    caption: String,
}

/// Hands out ids from `next_id` and remembers every upload and send.
struct RecordingTransport {
    next_id: AtomicI64,
    fail_upload_of: Option<String>,
    uploads: Mutex<Vec<String>>,
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingTransport {
    fn new(first_id: i64) -> Self {
        Self {
            next_id: AtomicI64::new(first_id),
            fail_upload_of: None,
            uploads: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, media: Vec<OutgoingMedia>) -> DeliveryId {
        let caption = media[0].caption.clone();
        self.sent.lock().unwrap().push(SentMessage {
            names: media.iter().map(|m| m.handle.name.clone()).collect(),
            kinds: media.iter().map(|m| m.kind).collect(),
            caption,
        });
        let count = media.len() as i64;
        DeliveryId::new(self.next_id.fetch_add(count, Ordering::SeqCst))
    }
}

impl MessagingTransport for RecordingTransport {
    fn resolve_destination(&self, chat_id: i64) -> Result<Destination> {
        Ok(Destination {
            chat_id,
            address: format!("chat:{chat_id}"),
        })
    }

    fn upload_item(&self, path: &Path, progress: &ItemProgress) -> Result<TransportHandle> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        self.uploads.lock().unwrap().push(name.clone());
        if self.fail_upload_of.as_deref() == Some(name.as_str()) {
            bail!("flood wait");
        }

        let size = fs::metadata(path)?.len();
        progress.set_total(size);
        progress.advance(size);
        Ok(TransportHandle {
            upload_id: progress.upload_id(),
            name,
            size,
            token: path.display().to_string(),
        })
    }

    fn send_single(&self, _destination: &Destination, media: OutgoingMedia) -> Result<DeliveryId> {
        Ok(self.record(vec![media]))
    }

    fn send_album(&self, _destination: &Destination, media: Vec<OutgoingMedia>) -> Result<DeliveryId> {
        Ok(self.record(media))
    }

    fn discard(&self, _handle: &TransportHandle) -> Result<()> {
        Ok(())
    }
}

struct Workspace {
    _root: TempDir,
    source: PathBuf,
    done: PathBuf,
    temp: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let source = root.path().join("upload");
        let done = root.path().join("done");
        let temp = root.path().join("tmp");
        for dir in [&source, &done, &temp] {
            fs::create_dir(dir).unwrap();
        }
        Self {
            _root: root,
            source,
            done,
            temp,
        }
    }

    fn add(&self, name: &str, size: usize) -> PathBuf {
        let path = self.source.join(name);
        fs::write(&path, vec![0u8; size]).unwrap();
        path
    }

    fn config(&self, max_size: u64) -> Config {
        Config::from_settings(UserSettings {
            source_dir: self.source.clone(),
            done_dir: self.done.clone(),
            temp_dir: self.temp.clone(),
            chat_id: 42,
            max_size,
            ..UserSettings::default()
        })
    }

    fn done_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.done)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn temp_is_empty(&self) -> bool {
        fs::read_dir(&self.temp).unwrap().next().is_none()
    }

    fn temp_entries(&self) -> Vec<PathBuf> {
        fs::read_dir(&self.temp)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }
}

fn uploader(
    workspace: &Workspace,
    max_size: u64,
    duration: f64,
    transport: Arc<RecordingTransport>,
) -> BatchUploader {
    BatchUploader::new(
        workspace.config(max_size),
        Arc::new(FakeTranscoder::new(duration)),
        transport,
        PipelineContext::detached(),
    )
    .unwrap()
}

fn failing_uploader(
    config: Config,
    transcoder: FakeTranscoder,
    transport: Arc<RecordingTransport>,
) -> BatchUploader {
    BatchUploader::new(
        config,
        Arc::new(transcoder),
        transport,
        PipelineContext::detached(),
    )
    .unwrap()
}

#[test]
fn test_photo_is_sent_and_relocated() {
    let workspace = Workspace::new();
    let photo = workspace.add("travel_sunset_beach.jpg", 2048);
    let transport = Arc::new(RecordingTransport::new(12345));

    let summary = uploader(&workspace, 0, 10.0, transport.clone()).run().unwrap();

    assert_eq!((summary.processed, summary.succeeded, summary.failed), (1, 1, 0));
    let sent = transport.sent.lock().unwrap();
    assert_eq!(
        sent[0],
        SentMessage {
            names: vec!["travel_sunset_beach.jpg".to_string()],
            kinds: vec![MediaKind::Photo],
            caption: "#travel sunset beach".to_string(),
        }
    );
    assert!(!photo.exists());
    assert_eq!(workspace.done_files(), vec!["travel_sunset_beach_msgid_12345.jpg"]);
}

#[test]
fn test_large_video_becomes_preview_plus_parts() {
    let workspace = Workspace::new();
    // 650 bytes over 650 s at a 200 byte limit: 200 s parts, four of them
    let video = workspace.add("trip_alps_day_one.mp4", 650);
    let transport = Arc::new(RecordingTransport::new(500));

    let summary = uploader(&workspace, 200, 650.0, transport.clone()).run().unwrap();

    assert_eq!(summary.succeeded, 1, "{:?}", summary.failures);
    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].names,
        vec![
            "trip_alps_day_one_preview.jpg",
            "trip_alps_day_one_part000.mp4",
            "trip_alps_day_one_part001.mp4",
            "trip_alps_day_one_part002.mp4",
            "trip_alps_day_one_part003.mp4",
        ]
    );
    assert_eq!(sent[0].kinds[0], MediaKind::Photo);
    assert!(sent[0].kinds[1..].iter().all(|k| *k == MediaKind::Video));
    assert_eq!(sent[0].caption, "#trip alps day one");

    assert!(!video.exists());
    assert_eq!(
        workspace.done_files(),
        vec![
            "trip_alps_day_one_msgid_500.mp4",
            "trip_alps_day_one_part000_msgid_500.mp4",
            "trip_alps_day_one_part001_msgid_500.mp4",
            "trip_alps_day_one_part002_msgid_500.mp4",
            "trip_alps_day_one_part003_msgid_500.mp4",
            "trip_alps_day_one_preview_msgid_500.jpg",
        ]
    );
    assert!(workspace.temp_is_empty());
}

#[test]
fn test_small_video_still_gets_preview() {
    let workspace = Workspace::new();
    workspace.add("clip_cat.mov", 100);
    let transport = Arc::new(RecordingTransport::new(7));

    let summary = uploader(&workspace, 0, 12.0, transport.clone()).run().unwrap();

    assert_eq!(summary.succeeded, 1, "{:?}", summary.failures);
    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent[0].names, vec!["clip_cat_preview.jpg", "clip_cat.mov"]);
    assert_eq!(
        workspace.done_files(),
        vec!["clip_cat_msgid_7.mov", "clip_cat_preview_msgid_7.jpg"]
    );
}

#[test]
fn test_too_many_parts_uploads_nothing() {
    let workspace = Workspace::new();
    // 1300 s at 100 s per part needs 13 parts
    let video = workspace.add("long_lecture.mp4", 1300);
    let transport = Arc::new(RecordingTransport::new(1));

    let summary = uploader(&workspace, 100, 1300.0, transport.clone()).run().unwrap();

    assert_eq!((summary.succeeded, summary.failed), (0, 1));
    assert_eq!(summary.failures[0].kind, "AlbumTooLarge");
    assert!(transport.uploads.lock().unwrap().is_empty());
    assert!(transport.sent.lock().unwrap().is_empty());
    assert!(video.exists());
    assert!(workspace.done_files().is_empty());
    assert!(workspace.temp_is_empty());
}

#[test]
fn test_failures_do_not_stop_the_batch() {
    let workspace = Workspace::new();
    let bad_name = workspace.add("nounderscore.pdf", 10);
    let rejected = workspace.add("b_rejected.png", 10);
    workspace.add("c_accepted.txt", 10);
    let transport = Arc::new(RecordingTransport {
        fail_upload_of: Some("b_rejected.png".to_string()),
        ..RecordingTransport::new(90)
    });

    let summary = uploader(&workspace, 0, 10.0, transport.clone()).run().unwrap();

    assert_eq!(
        (summary.processed, summary.succeeded, summary.failed),
        (3, 1, 2)
    );
    let kinds: Vec<&str> = summary.failures.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec!["UploadFailure", "InvalidFilenameFormat"]);
    assert!(bad_name.exists());
    assert!(rejected.exists());
    assert_eq!(workspace.done_files(), vec!["c_accepted_msgid_90.txt"]);
}

#[test]
fn test_cancelled_batch_touches_nothing() {
    let workspace = Workspace::new();
    let photo = workspace.add("a_b.jpg", 10);
    let transport = Arc::new(RecordingTransport::new(1));
    let context = PipelineContext::detached();
    context.cancel();

    let summary = BatchUploader::new(
        workspace.config(0),
        Arc::new(FakeTranscoder::new(1.0)),
        transport.clone(),
        context,
    )
    .unwrap()
    .run()
    .unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.processed, 0);
    assert!(photo.exists());
    assert!(transport.uploads.lock().unwrap().is_empty());
}

#[test]
fn test_stage_failures_keep_source_and_clear_scratch() {
    let cases = [
        (Stage::Probe, "ProbeFailure"),
        (Stage::Segment, "SegmentationFailure"),
        (Stage::Frame, "ThumbnailFailure"),
    ];

    for (stage, expected_kind) in cases {
        let workspace = Workspace::new();
        let video = workspace.add("trip_alps.mp4", 650);
        let transport = Arc::new(RecordingTransport::new(1));

        let summary = failing_uploader(
            workspace.config(200),
            FakeTranscoder::failing_at(650.0, stage),
            transport.clone(),
        )
        .run()
        .unwrap();

        assert_eq!((summary.succeeded, summary.failed), (0, 1), "{stage:?}");
        assert_eq!(summary.failures[0].kind, expected_kind);
        assert!(video.exists(), "{stage:?}");
        assert!(workspace.done_files().is_empty(), "{stage:?}");
        assert!(workspace.temp_is_empty(), "{stage:?}");
        assert!(transport.uploads.lock().unwrap().is_empty());
    }
}

#[test]
fn test_keep_temp_dir_leaves_scratch_behind() {
    let workspace = Workspace::new();
    let video = workspace.add("trip_alps.mp4", 650);
    let mut config = workspace.config(200);
    config.settings.keep_temp_dir = true;

    let summary = failing_uploader(
        config,
        FakeTranscoder::failing_at(650.0, Stage::Segment),
        Arc::new(RecordingTransport::new(1)),
    )
    .run()
    .unwrap();

    assert_eq!(summary.failures[0].kind, "SegmentationFailure");
    assert!(video.exists());
    let entries = workspace.temp_entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].is_dir());
    assert!(
        entries[0]
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("album_")
    );
}
