//! Spinners and progress bars with a plain-text fallback

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner for a long-running step.
///
/// In plain mode each distinct message is printed once, so CI logs show
/// every status transition.
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    message: String,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            message: String::new(),
            interactive: ctx.use_fancy_output(),
        }
    }

    pub fn start(&mut self, message: &str) {
        self.message = message.to_string();
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Replace the message; repeats are ignored
    pub fn message(&mut self, message: &str) {
        if message.is_empty() || message == self.message {
            return;
        }
        self.message = message.to_string();
        match self.spinner {
            Some(ref spinner) => spinner.set_message(message),
            None => println!("{} {}", style("...").dim(), message),
        }
    }

    /// Last message shown
    pub fn current(&self) -> &str {
        &self.message
    }

    pub fn stop(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.stop(message),
            None => println!("{} {}", style("[OK]").green(), message),
        }
    }

    pub fn stop_error(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.error(message),
            None => println!("{} {}", style("[FAIL]").red(), message),
        }
    }

    pub fn stop_warn(&mut self, message: &str) {
        match self.spinner.take() {
            Some(spinner) => spinner.cancel(message),
            None => println!("{} {}", style("[WARN]").yellow(), message),
        }
    }
}

/// Progress bar for fingerprinting project files
pub struct HashProgress {
    bar: Option<ProgressBar>,
}

impl HashProgress {
    pub fn new(ctx: &UiContext, total: usize) -> Self {
        let bar = if ctx.use_fancy_output() {
            let bar = ProgressBar::new(total as u64);
            let style = ProgressStyle::default_bar()
                .template("  {spinner:.green} Hashing {bar:24.green/dim} {pos}/{len} files {elapsed:.dim}")
                .map(|s| s.progress_chars("━╸─"))
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            bar.set_style(style);
            bar.enable_steady_tick(Duration::from_millis(120));
            Some(bar)
        } else {
            println!("{} Hashing {} files", style("...").dim(), total);
            None
        };
        Self { bar }
    }

    /// Record `done` of `total` files as hashed
    pub fn update(&self, done: usize, total: usize) {
        if let Some(ref bar) = self.bar {
            bar.set_length(total as u64);
            bar.set_position(done as u64);
        }
    }

    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}
