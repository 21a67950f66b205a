//! Progress bars and end-of-run summaries shared by the commands.

use framepack_core::{ImageFailure, ProgressEvent, ProgressFn};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One progress bar per per-image stage, created on the stage's first event.
#[derive(Default)]
pub struct StageProgress {
    multi: MultiProgress,
    bars: Mutex<HashMap<&'static str, ProgressBar>>,
}

impl StageProgress {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Callback to hand to the library.
    pub fn callback(self: &Arc<Self>) -> ProgressFn {
        let this = Arc::clone(self);
        Arc::new(move |event| this.update(event))
    }

    fn update(&self, event: ProgressEvent) {
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        let bar = bars
            .entry(event.stage)
            .or_insert_with(|| self.multi.add(stage_bar(event.stage, event.total as u64)));
        bar.set_position(event.completed as u64);
        if event.completed >= event.total {
            bar.finish();
        }
    }

    /// Remove all bars before the summary is printed.
    pub fn clear(&self) {
        if let Ok(bars) = self.bars.lock() {
            for bar in bars.values() {
                bar.finish_and_clear();
            }
        }
        let _ = self.multi.clear();
    }
}

fn stage_bar(stage: &'static str, total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} {prefix:>8} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_prefix(stage);
    pb
}

/// A labelled row of the summary table.
pub enum Row<'a> {
    Count(&'a str, usize),
    Text(&'a str, String),
    Rule,
}

/// Print a formatted summary table to stderr.
pub fn print_summary(title: &str, rows: &[Row<'_>], elapsed: Duration) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("  {:^34}", title);
    eprintln!("  ====================================");
    for row in rows {
        match row {
            Row::Count(label, value) => eprintln!("    {:<14}{:>8}", format!("{label}:"), value),
            Row::Text(label, value) => eprintln!("    {:<14}{:>8}", format!("{label}:"), value),
            Row::Rule => eprintln!("  ------------------------------------"),
        }
    }
    eprintln!("    {:<14}{:>7.1}s", "Duration:", elapsed.as_secs_f64());
    eprintln!("  ====================================");
}

/// List per-image failures under the summary.
pub fn print_failures(heading: &str, failures: &[ImageFailure]) {
    if failures.is_empty() {
        return;
    }
    eprintln!();
    eprintln!("  {heading}:");
    for failure in failures {
        eprintln!(
            "    [{}] {}: {}",
            failure.stage,
            failure.path.display(),
            failure.message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_bar_tracks_events() {
        let progress = StageProgress::new();
        let callback = progress.callback();
        callback(ProgressEvent {
            stage: "pad",
            completed: 1,
            total: 3,
        });
        callback(ProgressEvent {
            stage: "pad",
            completed: 2,
            total: 3,
        });

        let bars = progress.bars.lock().unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars["pad"].position(), 2);
        assert_eq!(bars["pad"].length(), Some(3));
    }
}
