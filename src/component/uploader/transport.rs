use super::progress::ItemProgress;
use crate::tools::MediaKind;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// Message id assigned by the transport; 0 means nothing was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryId(i64);

impl DeliveryId {
    pub const NONE: Self = Self(0);

    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_sent(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where messages go, as resolved by the transport from a chat id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub chat_id: i64,
    pub address: String,
}

/// Reference to bytes already stored on the transport side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportHandle {
    pub upload_id: Uuid,
    pub name: String,
    pub size: u64,
    pub token: String,
}

/// One entry of a send call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMedia {
    pub handle: TransportHandle,
    pub kind: MediaKind,
    pub caption: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Messaging service the pipeline delivers to.
///
/// `upload_item` may be called from several threads at once; the send calls are
/// issued only after every upload of the message has returned.
pub trait MessagingTransport: Send + Sync {
    fn resolve_destination(&self, chat_id: i64) -> Result<Destination>;

    /// Transfers the raw bytes of `path`, reporting through `progress`.
    fn upload_item(&self, path: &Path, progress: &ItemProgress) -> Result<TransportHandle>;

    fn send_single(&self, destination: &Destination, media: OutgoingMedia) -> Result<DeliveryId>;

    /// Sends all items as one album and returns the id of its first message.
    fn send_album(&self, destination: &Destination, media: Vec<OutgoingMedia>)
    -> Result<DeliveryId>;

    /// Releases an uploaded item that will never be sent.
    fn discard(&self, handle: &TransportHandle) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_id() {
        assert!(!DeliveryId::NONE.is_sent());
        assert!(DeliveryId::new(12345).is_sent());
        assert_eq!(DeliveryId::new(12345).to_string(), "12345");
        assert_eq!(DeliveryId::new(-7).get(), -7);
    }
}
