use crate::component::uploader::ProgressRegistry;
use crate::error::PipelineError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared state handed to every pipeline stage instead of globals:
/// the Ctrl-C flag and the upload progress registry.
#[derive(Clone)]
pub struct PipelineContext {
    shutdown_signal: Arc<AtomicBool>,
    progress: ProgressRegistry,
}

impl PipelineContext {
    #[must_use]
    pub const fn new(shutdown_signal: Arc<AtomicBool>, progress: ProgressRegistry) -> Self {
        Self {
            shutdown_signal,
            progress,
        }
    }

    /// Context with a fresh signal and a registry without observer.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(Arc::new(AtomicBool::new(false)), ProgressRegistry::new())
    }

    #[must_use]
    pub const fn shutdown_signal(&self) -> &Arc<AtomicBool> {
        &self.shutdown_signal
    }

    #[must_use]
    pub const fn progress(&self) -> &ProgressRegistry {
        &self.progress
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shutdown_signal.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.shutdown_signal.store(true, Ordering::SeqCst);
    }

    pub fn ensure_active(&self) -> Result<(), PipelineError> {
        if self.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }
}
