use super::progress::ItemProgress;
use super::transport::{DeliveryId, Destination, MessagingTransport, OutgoingMedia, TransportHandle};
use crate::error::PipelineError;
use crate::tools::{MediaKind, mime_type};
use anyhow::{Context, Result, bail};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// Bytes copied per progress step
pub const UPLOAD_PART_SIZE: usize = 512 * 1024;

const STATE_FILE: &str = "outbox_state.json";
const STAGING_DIR: &str = "staging";
const CHATS_DIR: &str = "chats";
const MANIFEST_FILE: &str = "message.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OutboxState {
    next_message_id: i64,
}

impl Default for OutboxState {
    fn default() -> Self {
        Self { next_message_id: 1 }
    }
}

/// Contents of `message.json` in every delivered message directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageManifest {
    pub id: i64,
    pub album_id: Option<Uuid>,
    pub chat_id: i64,
    pub kind: MediaKind,
    pub caption: String,
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// [`MessagingTransport`] that delivers into a directory tree:
///
/// ```text
/// <root>/outbox_state.json            next message id
/// <root>/staging/<upload id>_<name>   uploaded bytes awaiting a send
/// <root>/chats/<chat id>/<first id>/<message id>/{<name>, message.json}
/// ```
///
/// Every send is published as one delivery directory named after its first
/// message id, so an album appears in the chat completely or not at all.
pub struct OutboxTransport {
    root: PathBuf,
    shutdown_signal: Arc<AtomicBool>,
    state: Mutex<OutboxState>,
}

impl OutboxTransport {
    pub fn open(root: &Path, shutdown_signal: Arc<AtomicBool>) -> Result<Self> {
        fs::create_dir_all(root.join(STAGING_DIR))
            .with_context(|| format!("cannot create outbox at {}", root.display()))?;

        let state_path = root.join(STATE_FILE);
        let state = if state_path.exists() {
            let content = fs::read_to_string(&state_path)
                .with_context(|| format!("cannot read {}", state_path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("cannot parse {}", state_path.display()))?
        } else {
            OutboxState::default()
        };

        info!(
            "Outbox at {} (next message id {})",
            root.display(),
            state.next_message_id
        );

        Ok(Self {
            root: root.to_path_buf(),
            shutdown_signal,
            state: Mutex::new(state),
        })
    }

    /// Reserves `count` consecutive ids and persists the counter before returning.
    fn allocate_ids(&self, count: usize) -> Result<Vec<i64>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let first = state.next_message_id;
        let count = i64::try_from(count).context("too many messages")?;

        let next = OutboxState {
            next_message_id: first + count,
        };
        let state_path = self.root.join(STATE_FILE);
        let temp_path = state_path.with_extension("json.tmp");
        fs::write(&temp_path, serde_json::to_string_pretty(&next)?)
            .with_context(|| format!("cannot write {}", temp_path.display()))?;
        fs::rename(&temp_path, &state_path)
            .with_context(|| format!("cannot replace {}", state_path.display()))?;

        *state = next;
        Ok((first..first + count).collect())
    }

    fn chat_dir(&self, destination: &Destination) -> PathBuf {
        PathBuf::from(&destination.address)
    }

    fn staged_path(&self, handle: &TransportHandle) -> Result<PathBuf> {
        let path = PathBuf::from(&handle.token);
        if !path.starts_with(self.root.join(STAGING_DIR)) || !path.is_file() {
            bail!("unknown upload {} ({})", handle.upload_id, handle.name);
        }
        Ok(path)
    }

    /// Writes every message into a pending directory, then publishes it with a
    /// single rename. Staged files are kept on failure; see [`MessagingTransport::discard`].
    fn deliver(
        &self,
        destination: &Destination,
        media: Vec<OutgoingMedia>,
        album_id: Option<Uuid>,
    ) -> Result<DeliveryId> {
        if media.is_empty() {
            bail!("nothing to send");
        }
        if self.shutdown_signal.load(Ordering::SeqCst) {
            return Err(PipelineError::Cancelled.into());
        }

        let staged: Vec<PathBuf> = media
            .iter()
            .map(|m| self.staged_path(&m.handle))
            .collect::<Result<_>>()?;

        let chat_dir = self.chat_dir(destination);
        let pending_dir = chat_dir.join(format!(".pending-{}", Uuid::new_v4()));
        fs::create_dir_all(&pending_dir)
            .with_context(|| format!("cannot create {}", pending_dir.display()))?;

        let outcome = self
            .write_messages(destination, &media, &staged, album_id, &pending_dir)
            .and_then(|ids| {
                let delivery_dir = chat_dir.join(ids[0].to_string());
                fs::rename(&pending_dir, &delivery_dir)
                    .with_context(|| format!("cannot publish message {}", ids[0]))?;
                Ok(ids)
            });
        if outcome.is_err() {
            let _ = fs::remove_dir_all(&pending_dir);
        }

        let ids = outcome?;
        for path in &staged {
            let _ = fs::remove_file(path);
        }

        info!(
            "Delivered {} message(s) to chat {} starting at id {}",
            ids.len(),
            destination.chat_id,
            ids[0]
        );
        Ok(DeliveryId::new(ids[0]))
    }

    fn write_messages(
        &self,
        destination: &Destination,
        media: &[OutgoingMedia],
        staged: &[PathBuf],
        album_id: Option<Uuid>,
        pending_dir: &Path,
    ) -> Result<Vec<i64>> {
        let ids = self.allocate_ids(media.len())?;

        for ((item, staged_path), id) in media.iter().zip(staged).zip(&ids) {
            let message_dir = pending_dir.join(id.to_string());
            fs::create_dir_all(&message_dir)
                .with_context(|| format!("cannot create {}", message_dir.display()))?;

            let file_path = message_dir.join(&item.handle.name);
            fs::copy(staged_path, &file_path)
                .with_context(|| format!("cannot store {}", item.handle.name))?;

            let manifest = MessageManifest {
                id: *id,
                album_id,
                chat_id: destination.chat_id,
                kind: item.kind,
                caption: item.caption.clone(),
                file_name: item.handle.name.clone(),
                mime_type: mime_type(Path::new(&item.handle.name)).to_string(),
                size: item.handle.size,
                width: item.width,
                height: item.height,
            };
            fs::write(
                message_dir.join(MANIFEST_FILE),
                serde_json::to_string_pretty(&manifest)?,
            )
            .with_context(|| format!("cannot write manifest for message {id}"))?;
        }

        Ok(ids)
    }

    fn copy_in_parts(&self, source: &Path, target: &Path, progress: &ItemProgress) -> Result<u64> {
        let mut reader =
            File::open(source).with_context(|| format!("cannot open {}", source.display()))?;
        let size = reader.metadata()?.len();
        progress.set_total(size);

        let mut writer =
            File::create(target).with_context(|| format!("cannot create {}", target.display()))?;
        let mut buffer = vec![0u8; UPLOAD_PART_SIZE];
        let mut copied = 0u64;

        loop {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                return Err(PipelineError::Cancelled.into());
            }

            let read = reader
                .read(&mut buffer)
                .with_context(|| format!("cannot read {}", source.display()))?;
            if read == 0 {
                break;
            }
            writer
                .write_all(&buffer[..read])
                .with_context(|| format!("cannot write {}", target.display()))?;

            copied += read as u64;
            progress.advance(read as u64);
        }

        writer.sync_all()?;
        Ok(copied)
    }
}

impl MessagingTransport for OutboxTransport {
    fn resolve_destination(&self, chat_id: i64) -> Result<Destination> {
        if chat_id == 0 {
            bail!("chat id 0 is not a valid destination");
        }

        let chat_dir = self.root.join(CHATS_DIR).join(chat_id.to_string());
        fs::create_dir_all(&chat_dir)
            .with_context(|| format!("cannot create {}", chat_dir.display()))?;

        Ok(Destination {
            chat_id,
            address: chat_dir.to_string_lossy().into_owned(),
        })
    }

    fn upload_item(&self, path: &Path, progress: &ItemProgress) -> Result<TransportHandle> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("no file name in {}", path.display()))?;
        let upload_id = progress.upload_id();
        let staged = self
            .root
            .join(STAGING_DIR)
            .join(format!("{upload_id}_{name}"));

        let size = match self.copy_in_parts(path, &staged, progress) {
            Ok(size) => size,
            Err(e) => {
                let _ = fs::remove_file(&staged);
                return Err(e);
            }
        };
        debug!("Staged {name} ({size} bytes) as {upload_id}");

        Ok(TransportHandle {
            upload_id,
            name,
            size,
            token: staged.to_string_lossy().into_owned(),
        })
    }

    fn send_single(&self, destination: &Destination, media: OutgoingMedia) -> Result<DeliveryId> {
        self.deliver(destination, vec![media], None)
    }

    fn send_album(
        &self,
        destination: &Destination,
        media: Vec<OutgoingMedia>,
    ) -> Result<DeliveryId> {
        self.deliver(destination, media, Some(Uuid::new_v4()))
    }

    fn discard(&self, handle: &TransportHandle) -> Result<()> {
        let path = PathBuf::from(&handle.token);
        if !path.starts_with(self.root.join(STAGING_DIR)) {
            bail!("unknown upload {} ({})", handle.upload_id, handle.name);
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Released {} ({})", handle.name, handle.upload_id);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("cannot remove {}", path.display())),
        }
    }
}
