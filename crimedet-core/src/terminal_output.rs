//! Simple terminal output functions for crimedet-core.
//!
//! This module provides basic terminal formatting functions that maintain
//! the hierarchical output structure used by the CLI, plus the progress bar
//! shown while clips are embedded.

use crate::processing::Decision;

use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::info;
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::sync::Mutex;

struct ProgressState {
    progress_bar: Option<ProgressBar>,
}

impl ProgressState {
    const fn new() -> Self {
        Self { progress_bar: None }
    }
}

static PROGRESS_STATE: Mutex<ProgressState> = Mutex::new(ProgressState::new());

/// Check if color should be used (respects NO_COLOR environment variable)
fn should_use_color() -> bool {
    std::env::var("NO_COLOR").is_err()
}

/// Print a section header (Level 1 - Main sections with cyan color)
pub fn print_section(title: &str) {
    info!("");
    if should_use_color() {
        info!("===== {} =====", title.to_uppercase().cyan().bold());
    } else {
        info!("===== {} =====", title.to_uppercase());
    }
    info!("");
}

/// Print a processing step (Level 2 - Subsections with 2 spaces indentation and bold)
pub fn print_processing(message: &str) {
    info!("");
    if should_use_color() {
        info!("  {} {}", "»", style(message).bold());
    } else {
        info!("  » {}", message);
    }
}

/// Print a status line (Level 4 - Primary info with 6 spaces indentation)
pub fn print_status(label: &str, value: &str, highlight: bool) {
    let label_width: usize = 26;
    let padding = label_width.saturating_sub(label.len()).max(1);

    if should_use_color() && highlight {
        info!("      {}:{} {}", label, " ".repeat(padding), style(value).bold());
    } else {
        info!("      {}:{} {}", label, " ".repeat(padding), value);
    }
}

/// Print a success message (Level 2 - Success with 2 spaces indentation and green color)
pub fn print_success(message: &str) {
    info!("");
    if should_use_color() {
        info!("  ✓ {}", message.green());
    } else {
        info!("  ✓ {}", message);
    }
}

/// Print a warning message (Level 2 - yellow)
pub fn print_warning(message: &str) {
    if should_use_color() {
        info!("  ! {}", message.yellow());
    } else {
        info!("  ! {}", message);
    }
}

/// Print an error message (Level 2 - red)
pub fn print_error(message: &str) {
    if should_use_color() {
        info!("  ✗ {}", message.red().bold());
    } else {
        info!("  ✗ {}", message);
    }
}

/// Print a sub-item (Level 3 - Operations with 4 spaces indentation)
pub fn print_sub_item(message: &str) {
    info!("    {}", message);
}

/// Prints the scores and verdict of an analysis.
pub fn print_decision(decision: &Decision) {
    print_status("Clips", &decision.clip_count.to_string(), false);
    print_status(
        "Classifier Conf (Crime)",
        &format!("{:.2}", decision.crime_confidence),
        false,
    );
    print_status(
        "Classifier Conf (No Crime)",
        &format!("{:.2}", decision.normal_confidence),
        false,
    );
    print_status("Anomaly Score", &format!("{:.2}", decision.anomaly_score), false);

    let label = decision.verdict.to_string().to_uppercase();
    let summary = format!(
        "RESULT: {} (Classifier conf={:.2}, Anomaly score={:.2})",
        label, decision.confidence, decision.anomaly_score
    );
    info!("");
    if !should_use_color() {
        info!("  {}", summary);
    } else if decision.verdict.is_crime() {
        info!("  {}", summary.red().bold());
    } else {
        info!("  {}", summary.green().bold());
    }
}

/// Initialize a progress bar
fn init_progress_bar(total_clips: u64) -> Option<ProgressBar> {
    let style = ProgressStyle::default_bar()
        .template("Embedding: {percent:>3}% [{bar:30}] {pos}/{len} clips ({elapsed_precise} / {eta_precise})")
        .ok()?
        .progress_chars("##.");

    let pb = ProgressBar::new(total_clips);
    pb.set_style(style);

    if !std::io::stderr().is_terminal() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }

    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Some(pb)
}

/// Advances the clip-embedding progress bar, creating it on first use.
pub fn print_clip_progress(done: usize, total: usize) {
    if !std::io::stderr().is_terminal() {
        return;
    }

    let Ok(mut state) = PROGRESS_STATE.lock() else {
        return;
    };

    if state.progress_bar.is_none() {
        state.progress_bar = init_progress_bar(total as u64);
    }

    if let Some(pb) = state.progress_bar.as_ref() {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    }
}

/// Clear progress bar
pub fn clear_progress_bar() {
    if let Ok(mut state) = PROGRESS_STATE.lock() {
        if let Some(pb) = state.progress_bar.take() {
            pb.finish_and_clear();
        }
    }
}
