use console::style;
use log::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub file_name: String,
    pub kind: &'static str,
    pub message: String,
}

/// Counts for one pass over the source directory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Set when an interrupt stopped the batch early
    pub cancelled: bool,
    pub failures: Vec<FileFailure>,
}

impl BatchSummary {
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub(super) fn record_success(&mut self) {
        self.processed += 1;
        self.succeeded += 1;
    }

    pub(super) fn record_failure(&mut self, file_name: &str, kind: &'static str, message: String) {
        self.processed += 1;
        self.failed += 1;
        self.failures.push(FileFailure {
            file_name: file_name.to_string(),
            kind,
            message,
        });
    }

    pub fn print(&self) {
        println!();
        println!("{}", style("=== Upload summary ===").cyan().bold());
        println!("  Processed: {}", self.processed);
        println!("  Succeeded: {}", style(self.succeeded).green());
        if self.failed > 0 {
            println!("  Failed: {}", style(self.failed).red());
            for failure in &self.failures {
                println!(
                    "    {} {} [{}] {}",
                    style("✗").red(),
                    failure.file_name,
                    failure.kind,
                    style(&failure.message).dim()
                );
            }
        }
        if self.cancelled {
            println!("{}", style("Stopped early by interrupt").yellow());
        }

        info!(
            "Batch finished: processed={}, succeeded={}, failed={}",
            self.processed, self.succeeded, self.failed
        );
    }
}
