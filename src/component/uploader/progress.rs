use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Live transfer state of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressState {
    pub upload_id: Uuid,
    pub name: String,
    /// `None` until the transport knows the size
    pub total: Option<u64>,
    pub transferred: u64,
}

/// Presentation hook, called after each registry change without the lock held.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, state: &ProgressState);

    fn on_finish(&self, state: &ProgressState, success: bool);
}

/// Shared map of in-flight uploads keyed by upload id.
///
/// Cloning shares the same map. Every insert, update and removal goes through the
/// mutex; entries disappear once their upload finishes.
#[derive(Clone, Default)]
pub struct ProgressRegistry {
    entries: Arc<Mutex<HashMap<Uuid, ProgressState>>>,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl ProgressRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_observer(observer: Arc<dyn ProgressObserver>) -> Self {
        Self {
            entries: Arc::default(),
            observer: Some(observer),
        }
    }

    /// Registers a new upload and returns the handle the transport reports through.
    #[must_use]
    pub fn begin(&self, name: &str) -> ItemProgress {
        let state = ProgressState {
            upload_id: Uuid::new_v4(),
            name: name.to_string(),
            total: None,
            transferred: 0,
        };
        let upload_id = state.upload_id;

        self.lock().insert(upload_id, state.clone());
        if let Some(observer) = &self.observer {
            observer.on_progress(&state);
        }

        ItemProgress {
            registry: self.clone(),
            upload_id,
            finished: false,
        }
    }

    #[must_use]
    pub fn get(&self, upload_id: Uuid) -> Option<ProgressState> {
        self.lock().get(&upload_id).cloned()
    }

    /// Copy of all in-flight entries, sorted by name.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ProgressState> {
        let mut states: Vec<ProgressState> = self.lock().values().cloned().collect();
        states.sort_by(|a, b| a.name.cmp(&b.name));
        states
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, ProgressState>> {
        // a panicking observer must not take the registry down with it
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, upload_id: Uuid, apply: impl FnOnce(&mut ProgressState)) {
        let updated = {
            let mut entries = self.lock();
            entries.get_mut(&upload_id).map(|state| {
                apply(state);
                state.clone()
            })
        };

        if let (Some(state), Some(observer)) = (updated, &self.observer) {
            observer.on_progress(&state);
        }
    }

    fn remove(&self, upload_id: Uuid, success: bool) {
        let removed = self.lock().remove(&upload_id);

        if let (Some(state), Some(observer)) = (removed, &self.observer) {
            observer.on_finish(&state, success);
        }
    }
}

/// Progress handle for one upload. Dropping it without [`ItemProgress::finish`]
/// removes the entry as failed.
pub struct ItemProgress {
    registry: ProgressRegistry,
    upload_id: Uuid,
    finished: bool,
}

impl ItemProgress {
    #[must_use]
    pub const fn upload_id(&self) -> Uuid {
        self.upload_id
    }

    pub fn set_total(&self, total: u64) {
        self.registry
            .update(self.upload_id, |state| state.total = Some(total));
    }

    pub fn advance(&self, bytes: u64) {
        self.registry.update(self.upload_id, |state| {
            state.transferred = state.transferred.saturating_add(bytes);
        });
    }

    pub fn finish(mut self, success: bool) {
        self.finished = true;
        self.registry.remove(self.upload_id, success);
    }
}

impl Drop for ItemProgress {
    fn drop(&mut self) {
        if !self.finished {
            self.registry.remove(self.upload_id, false);
        }
    }
}
