//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying progress spinners,
//! run summaries and errors to the user.

use std::cell::RefCell;
use std::io::IsTerminal;

use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use crate::core::pack::{PackSummary, Progress};

/// Output preferences for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Suppress everything but errors
    pub quiet: bool,
    /// Print the run summary as JSON
    pub json: bool,
    /// Verbosity level (-v count)
    pub verbose: u8,
}

impl OutputConfig {
    /// Create output preferences
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self {
            quiet,
            json,
            verbose,
        }
    }

    /// Log level implied by the flags
    pub fn level(&self) -> tracing::Level {
        if self.quiet {
            return tracing::Level::ERROR;
        }
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            _ => tracing::Level::DEBUG,
        }
    }

    /// Whether progress spinners should be drawn
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.json && std::io::stderr().is_terminal()
    }
}

/// Initialize the tracing subscriber on stderr
///
/// `RUST_LOG` directives are honoured; the flags set the floor.
pub fn init_tracing(config: &OutputConfig) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(config.level().into()))
        .try_init();
}

/// Create a spinner for operations with unknown duration
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.blue} {msg}")
            .expect("Invalid spinner template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// Progress reported through a spinner on stderr
#[derive(Default)]
pub struct SpinnerProgress {
    enabled: bool,
    current: RefCell<Option<ProgressBar>>,
}

impl SpinnerProgress {
    /// Create a spinner reporter; a disabled one draws nothing
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            current: RefCell::new(None),
        }
    }
}

impl Progress for SpinnerProgress {
    fn begin(&self, message: &str) {
        if self.enabled {
            if let Some(previous) = self.current.replace(Some(create_spinner(message))) {
                previous.finish_and_clear();
            }
        }
    }

    fn end(&self) {
        if let Some(spinner) = self.current.take() {
            spinner.finish_and_clear();
        }
    }
}

/// Print the run summary according to `config`
pub fn print_summary(summary: &PackSummary, config: &OutputConfig) -> anyhow::Result<()> {
    if config.json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }
    if config.quiet {
        return Ok(());
    }

    for entry in &summary.entries {
        println!("{} {} ({} bytes)", status::SUCCESS, entry.name, entry.size);
    }
    for skipped in &summary.skipped {
        println!(
            "{} skipped {}: {}",
            status::INFO,
            skipped.partition,
            skipped.reason
        );
    }
    for collision in &summary.radio_collisions {
        println!(
            "{} radio file {} not added, name already in archive",
            status::WARNING,
            collision.display()
        );
    }
    println!("Wrote {}", summary.output.display());
    Ok(())
}

/// Print an error and its causes to stderr
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} Error: {}", status::ERROR, error);
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_flags() {
        assert_eq!(OutputConfig::new(false, false, 0).level(), tracing::Level::WARN);
        assert_eq!(OutputConfig::new(false, false, 1).level(), tracing::Level::INFO);
        assert_eq!(OutputConfig::new(false, false, 3).level(), tracing::Level::DEBUG);
        assert_eq!(OutputConfig::new(true, false, 2).level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_json_hides_progress() {
        assert!(!OutputConfig::new(false, true, 0).show_progress());
        assert!(!OutputConfig::new(true, false, 0).show_progress());
    }

    #[test]
    fn test_disabled_spinner_is_silent() {
        let progress = SpinnerProgress::new(false);
        progress.begin("Building system image");
        assert!(progress.current.borrow().is_none());
        progress.end();
    }
}
