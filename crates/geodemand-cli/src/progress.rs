use geodemand_pipeline::{DayPhase, DayProgress};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const SPINNER_TICKS: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Create a spinner for indeterminate progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_strings(&SPINNER_TICKS));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Create a progress bar for determinate progress
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{msg}\n[{bar:40.cyan/blue}] {pos}/{len} ({percent}%) ETA: {eta}")
    {
        pb.set_style(style.progress_chars("█▓▒░ "));
    }
    pb.set_message(message.to_string());
    pb
}

/// Finish a progress bar with success message
pub fn finish_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✓ {}", message));
}

/// Finish a progress bar with error message
pub fn finish_error(pb: &ProgressBar, message: &str) {
    pb.abandon_with_message(format!("✗ {}", message));
}

/// Progress display for multi-day recomputes
pub struct RangeProgress {
    bar: ProgressBar,
}

impl RangeProgress {
    /// A bar over `total` days. Hidden when `hidden` is set, e.g. for JSON output.
    pub fn new(total: usize, hidden: bool) -> Self {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            create_progress_bar(total as u64, "Recomputing")
        };
        Self { bar }
    }

    pub fn update(&self, progress: &DayProgress) {
        match progress.phase {
            DayPhase::Started => {
                self.bar.set_message(format!("Recomputing {}", progress.date));
            }
            DayPhase::Completed => {
                self.bar.set_position((progress.current + 1) as u64);
            }
            DayPhase::Failed => {
                self.bar.set_message(progress.message.clone());
            }
        }
    }

    pub fn finish(&self, completed: usize, failed: bool) {
        if failed {
            finish_error(&self.bar, &format!("Stopped after {} day(s)", completed));
        } else {
            finish_success(&self.bar, &format!("Recomputed {} day(s)", completed));
        }
    }
}
