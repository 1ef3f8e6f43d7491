use super::transport::{DeliveryId, Destination, MessagingTransport, OutgoingMedia, TransportHandle};
use crate::component::album_builder::{AlbumRequest, MediaItem};
use crate::context::PipelineContext;
use crate::error::PipelineError;
use anyhow::{Context, anyhow};
use log::{debug, info, warn};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;

/// Uploads media through a [`MessagingTransport`] and sends it as one message.
pub struct UploadOrchestrator {
    transport: Arc<dyn MessagingTransport>,
    context: PipelineContext,
}

impl UploadOrchestrator {
    #[must_use]
    pub fn new(transport: Arc<dyn MessagingTransport>, context: PipelineContext) -> Self {
        Self { transport, context }
    }

    pub fn resolve_destination(&self, chat_id: i64) -> anyhow::Result<Destination> {
        self.transport
            .resolve_destination(chat_id)
            .with_context(|| format!("cannot resolve chat {chat_id}"))
    }

    /// One file, one message.
    pub fn upload_single(
        &self,
        destination: &Destination,
        item: &MediaItem,
    ) -> Result<DeliveryId, PipelineError> {
        let handle = self.upload_item(item)?;
        if let Err(e) = self.context.ensure_active() {
            self.discard_all(std::slice::from_ref(&handle));
            return Err(e);
        }

        let id = self
            .transport
            .send_single(destination, outgoing(item, handle.clone()))
            .map_err(|e| {
                self.discard_all(std::slice::from_ref(&handle));
                upload_failure(&item.path, e)
            })?;

        checked_id(id, &item.path)
    }

    /// Uploads every item concurrently, waits for all of them, and sends the album
    /// only if each one succeeded. Item order is that of `album`.
    pub fn upload_album(
        &self,
        destination: &Destination,
        album: &AlbumRequest,
    ) -> Result<DeliveryId, PipelineError> {
        self.context.ensure_active()?;
        let items = album.items();
        let first_path = &items[0].path;

        let pool = ThreadPoolBuilder::new()
            .num_threads(items.len())
            .thread_name(|index| format!("upload-{index}"))
            .build()
            .map_err(|e| upload_failure(first_path, anyhow!(e)))?;

        let results: Vec<Result<TransportHandle, PipelineError>> =
            pool.install(|| items.par_iter().map(|item| self.upload_item(item)).collect());

        let mut handles = Vec::with_capacity(items.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            self.discard_all(&handles);
            return Err(e);
        }
        if let Err(e) = self.context.ensure_active() {
            self.discard_all(&handles);
            return Err(e);
        }

        let media: Vec<OutgoingMedia> = items
            .iter()
            .zip(&handles)
            .map(|(item, handle)| outgoing(item, handle.clone()))
            .collect();
        info!("Sending album of {} items", media.len());
        let id = self.transport.send_album(destination, media).map_err(|e| {
            self.discard_all(&handles);
            upload_failure(first_path, e)
        })?;

        checked_id(id, first_path)
    }

    /// Best effort: a handle that cannot be released is only logged.
    fn discard_all(&self, handles: &[TransportHandle]) {
        for handle in handles {
            if let Err(e) = self.transport.discard(handle) {
                warn!("Cannot release upload {} ({}): {e:#}", handle.upload_id, handle.name);
            }
        }
    }

    fn upload_item(&self, item: &MediaItem) -> Result<TransportHandle, PipelineError> {
        self.context.ensure_active()?;

        let name = item
            .path
            .file_name()
            .map_or_else(|| item.path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let progress = self.context.progress().begin(&name);
        debug!("Uploading {name} [{}]", progress.upload_id());

        let result = self.transport.upload_item(&item.path, &progress);
        progress.finish(result.is_ok());

        result.map_err(|e| upload_failure(&item.path, e))
    }
}

fn outgoing(item: &MediaItem, handle: TransportHandle) -> OutgoingMedia {
    OutgoingMedia {
        handle,
        kind: item.kind,
        caption: item.caption.clone(),
        width: item.width,
        height: item.height,
    }
}

fn upload_failure(path: &Path, error: anyhow::Error) -> PipelineError {
    PipelineError::or_cancelled(error, |source| PipelineError::UploadFailure {
        path: path.to_path_buf(),
        source,
    })
}

fn checked_id(id: DeliveryId, path: &Path) -> Result<DeliveryId, PipelineError> {
    if id.is_sent() {
        Ok(id)
    } else {
        Err(upload_failure(path, anyhow!("transport returned no message id")))
    }
}
