//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying progress bars,
//! per-module colored output, and formatted messages to the user.

use indicatif::{ProgressBar, ProgressStyle};

use crate::config::defaults;

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

/// Create a progress bar for build levels
pub fn create_build_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} modules ({msg})")
            .expect("Invalid progress bar template")
            .progress_chars("█▓▒░"),
    );
    pb
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

/// ANSI color codes cycled across concurrent modules
const MODULE_COLORS: &[&str] = &[
    "\x1b[36m", // cyan
    "\x1b[35m", // magenta
    "\x1b[33m", // yellow
    "\x1b[32m", // green
    "\x1b[34m", // blue
    "\x1b[31m", // red
];

const RESET: &str = "\x1b[0m";

/// Whether an output line matches one of the interesting build-tool markers
pub fn is_interesting_line(line: &str) -> bool {
    defaults::INTERESTING_OUTPUT_MARKERS
        .iter()
        .any(|marker| line.contains(marker))
}

/// Per-module output formatter for concurrently running builds.
///
/// Each concurrent task owns its formatter, parameterized by the module's
/// assigned index; there is no shared color state to race on. Lines from
/// simultaneously running modules interleave on the terminal, which is why
/// every line carries the module prefix.
#[derive(Debug, Clone)]
pub struct ModuleFormatter {
    module_name: String,
    color: &'static str,
    verbose: bool,
}

impl ModuleFormatter {
    /// Create a formatter for the module at the given scheduling index
    pub fn new(module_name: &str, index: usize, verbose: bool) -> Self {
        Self {
            module_name: module_name.to_string(),
            color: MODULE_COLORS[index % MODULE_COLORS.len()],
            verbose,
        }
    }

    /// Prefix a line with the module tag
    pub fn format_line(&self, line: &str) -> String {
        format!("{}[{}]{} {line}", self.color, self.module_name, RESET)
    }

    /// Print a subprocess output line if it is worth showing.
    ///
    /// Filtered to the fixed marker set unless verbose; display only - the
    /// full output is captured separately for the per-module log.
    pub fn emit(&self, line: &str) {
        if self.verbose || is_interesting_line(line) {
            println!("{}", self.format_line(line));
        }
    }

}

/// Display an error to stderr with its cause chain
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}
