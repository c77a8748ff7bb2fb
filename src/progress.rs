use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Receives the batch progress every time a mission completes.
pub trait Reporter: Send + Sync {
    fn advance(&self, completed: usize, total: usize);

    fn done(&self) {}
}

impl Reporter for ProgressBar {
    fn advance(&self, completed: usize, total: usize) {
        self.set_length(total as u64);
        self.set_position(completed as u64);
    }

    fn done(&self) {
        self.finish();
    }
}

/// The episode counter drawn on the console.
pub fn console_bar() -> Result<ProgressBar> {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{elapsed_precise} [{wide_bar}] {pos}/{len} ep ({eta})")?
            .progress_chars("=> "),
    );
    Ok(bar)
}

/// Counts completed missions, successful or not.
pub struct BatchProgress<'a> {
    completed: AtomicUsize,
    total: usize,
    reporter: &'a dyn Reporter,
}

impl<'a> BatchProgress<'a> {
    pub fn new(total: usize, reporter: &'a dyn Reporter) -> Self {
        reporter.advance(0, total);
        BatchProgress {
            completed: AtomicUsize::new(0),
            total,
            reporter,
        }
    }

    /// Marks one more mission as completed and returns the new count.
    pub fn increment(&self) -> usize {
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        self.reporter.advance(completed, self.total);
        completed
    }

    pub fn finish(self) -> usize {
        self.reporter.done();
        self.completed.into_inner()
    }
}
