//! Progress indicators with CI fallback

use super::terminal::Terminal;
use crate::worker::{LifecycleObserver, WorkerState};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::OnceLock;
use url::Url;
use uuid::Uuid;

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    /// Create a new spinner (shows immediately in interactive mode)
    pub fn new(term: &Terminal) -> Self {
        Self {
            spinner: None,
            interactive: term.is_fancy(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            // Plain output for CI
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else if self.interactive {
            // Fallback if spinner wasn't started
            println!("{} {}", style("✓").green(), message);
        } else {
            println!("{} {}", style("[OK]").green(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else if self.interactive {
            println!("{} {}", style("✗").red(), message);
        } else {
            println!("{} {}", style("[FAIL]").red(), message);
        }
    }
}

/// Progress bar for precaching static assets during worker install.
///
/// The bar appears on the first fetched asset, so an idempotent
/// registration that installs nothing prints nothing.
pub struct PrecacheProgress {
    bar: OnceLock<ProgressBar>,
    label: String,
    interactive: bool,
}

impl PrecacheProgress {
    pub fn new(term: &Terminal, label: &str) -> Self {
        Self {
            bar: OnceLock::new(),
            label: label.to_string(),
            interactive: term.is_fancy(),
        }
    }

    fn bar(&self, total: usize) -> &ProgressBar {
        self.bar.get_or_init(|| {
            let bar = ProgressBar::new(total as u64);
            let bar_style = ProgressStyle::default_bar()
                .template("  {spinner:.cyan} Precaching {prefix}  {bar:20.cyan/dim} {pos}/{len} {msg:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                .progress_chars("━╸─");
            bar.set_style(bar_style);
            bar.set_prefix(self.label.clone());
            bar.enable_steady_tick(std::time::Duration::from_millis(120));
            bar
        })
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Some(bar) = self.bar.get() {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

impl LifecycleObserver for PrecacheProgress {
    fn asset_fetched(&self, done: usize, total: usize, url: &Url) {
        if self.interactive {
            let bar = self.bar(total);
            bar.set_position(done as u64);
            bar.set_message(url.path().to_string());
        } else {
            println!("  [{}/{}] {}", done, total, url);
        }
    }

    fn state_changed(&self, _worker: Uuid, state: WorkerState) {
        if matches!(state, WorkerState::Installed | WorkerState::Redundant) {
            self.finish();
        }
    }
}
