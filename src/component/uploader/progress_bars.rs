use super::progress::{ProgressObserver, ProgressState};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Terminal rendering of the progress registry: one bar per in-flight upload.
pub struct UploadProgressBars {
    multi: MultiProgress,
    bars: Mutex<HashMap<Uuid, ProgressBar>>,
}

impl UploadProgressBars {
    #[must_use]
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    #[must_use]
    pub fn with_draw_target(target: ProgressDrawTarget) -> Self {
        Self {
            multi: MultiProgress::with_draw_target(target),
            bars: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn active(&self) -> usize {
        self.bars.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn new_bar(&self, state: &ProgressState) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new(state.total.unwrap_or(0)));
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("#>-"),
        );
        bar.set_message(state.name.clone());
        bar
    }
}

impl Default for UploadProgressBars {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for UploadProgressBars {
    fn on_progress(&self, state: &ProgressState) {
        let mut bars = self.bars.lock().unwrap_or_else(PoisonError::into_inner);
        let bar = bars
            .entry(state.upload_id)
            .or_insert_with(|| self.new_bar(state));

        if let Some(total) = state.total {
            bar.set_length(total);
        }
        bar.set_position(state.transferred);
    }

    fn on_finish(&self, state: &ProgressState, success: bool) {
        let bar = self
            .bars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&state.upload_id);

        if let Some(bar) = bar {
            if success {
                bar.finish_and_clear();
            } else {
                bar.abandon_with_message(format!("{} failed", state.name));
            }
            self.multi.remove(&bar);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::uploader::ProgressRegistry;
    use std::sync::Arc;

    #[test]
    fn test_bars_follow_registry() {
        let bars = Arc::new(UploadProgressBars::with_draw_target(
            ProgressDrawTarget::hidden(),
        ));
        let registry = ProgressRegistry::with_observer(bars.clone());

        let first = registry.begin("a.mp4");
        let second = registry.begin("b.mp4");
        first.set_total(1024);
        first.advance(512);
        assert_eq!(bars.active(), 2);

        first.finish(true);
        drop(second);
        assert_eq!(bars.active(), 0);
    }
}
