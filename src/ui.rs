//! Terminal presentation for the daemon: start-up stage spinners, capture
//! history lines and the leaderboard table.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

use crate::capture::CaptureRecord;
use crate::events::SessionObserver;
use crate::leaderboard::LeaderboardEntry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    is_tty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, is_tty: bool) -> Self {
        Self { mode, is_tty }
    }

    pub fn from_args(ui_flag: Option<&str>, is_tty: bool) -> Self {
        let mode = match ui_flag {
            Some("plain") => UiMode::Plain,
            Some("pretty") => UiMode::Pretty,
            _ => UiMode::Auto,
        };
        Self::new(mode, is_tty)
    }

    fn pretty(&self) -> bool {
        self.is_tty && self.mode != UiMode::Plain
    }

    /// Show a start-up stage until the returned guard drops.
    pub fn stage(&self, name: &str) -> StageGuard {
        if self.pretty() {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.set_message(format!("{name}…"));
            StageGuard::new(name.to_string(), Some(spinner))
        } else {
            eprintln!("==> {}", name);
            StageGuard::new(name.to_string(), None)
        }
    }
}

pub struct StageGuard {
    name: String,
    start: Instant,
    spinner: Option<ProgressBar>,
    failed: Option<String>,
}

impl StageGuard {
    fn new(name: String, spinner: Option<ProgressBar>) -> Self {
        Self {
            name,
            start: Instant::now(),
            spinner,
            failed: None,
        }
    }

    /// Mark the stage as failed; the reason is shown when the guard drops.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.failed = Some(reason.into());
    }
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let elapsed = format_duration(self.start.elapsed());
        let message = match &self.failed {
            None => format!("✔ {} ({})", self.name, elapsed),
            Some(reason) => format!("✘ {} ({}): {}", self.name, elapsed, reason),
        };
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(message);
        } else {
            eprintln!("{message}");
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// One history line, e.g. `#3 Gir 92%`.
pub fn render_capture(record: &CaptureRecord) -> String {
    format!(
        "#{} {} {}%",
        record.sequence,
        record.label,
        record.confidence_percent()
    )
}

/// Leaderboard as aligned text rows, highest count first.
pub fn render_leaderboard(ranked: &[LeaderboardEntry]) -> String {
    if ranked.is_empty() {
        return "no breeds recorded yet".to_string();
    }
    let width = ranked
        .iter()
        .map(|entry| entry.category.chars().count())
        .max()
        .unwrap_or(0);
    ranked
        .iter()
        .enumerate()
        .map(|(rank, entry)| {
            format!(
                "{:>2}. {:<width$}  {:>4}x",
                rank + 1,
                entry.category,
                entry.count,
                width = width
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Observer that prints captures and the cow counter to stderr.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_capture_recorded(&mut self, record: &CaptureRecord) {
        eprintln!("capture {}", render_capture(record));
    }

    fn on_global_count_changed(&mut self, count: u64) {
        eprintln!("cows detected: {}", count);
    }
}
