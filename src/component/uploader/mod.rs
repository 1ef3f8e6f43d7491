//! Per-item upload with progress, then one atomic send

mod main;
mod outbox;
mod progress;
mod progress_bars;
mod transport;

pub use main::UploadOrchestrator;
pub use outbox::{MessageManifest, OutboxTransport, UPLOAD_PART_SIZE};
pub use progress::{ItemProgress, ProgressObserver, ProgressRegistry, ProgressState};
pub use progress_bars::UploadProgressBars;
pub use transport::{
    DeliveryId, Destination, MessagingTransport, OutgoingMedia, TransportHandle,
};
