// ============================================================
// Layer 6 — Progress Bars
// ============================================================
// One bar per phase ("Training Loop", "Validation Loop",
// "Testing"). indicatif draws to stderr and hides itself when
// stderr is not a terminal, so tests and piped runs stay quiet.

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{prefix:>16} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) {msg}";

/// Bar over `len` samples labelled with `phase`.
pub fn phase_bar(phase: &str, len: usize) -> ProgressBar {
    let style = ProgressStyle::with_template(TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");

    let bar = ProgressBar::new(len as u64);
    bar.set_style(style);
    bar.set_prefix(phase.to_string());
    bar
}
