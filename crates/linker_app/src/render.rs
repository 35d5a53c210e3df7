use std::fmt::Write;

use chrono::{DateTime, Local};
use linker_core::{InstructionSet, LinkViewModel, RemoteStatus, StepResult};

/// Line for the newest step of `view`, or `None` before the first step.
pub fn progress_line(view: &LinkViewModel) -> Option<String> {
    view.last_step()
        .map(|step| step_line(step, view.progress_percent))
}

/// `[ 40%] ok   Initializing: initialized repository on main`
fn step_line(step: &StepResult, percent: u8) -> String {
    let mark = if step.succeeded { "ok" } else { "FAIL" };
    let mut line = format!("[{percent:>3}%] {mark:<4} {}: {}", step.step_name(), step.message);
    if let Some(kind) = step.error {
        let _ = write!(line, " ({kind})");
    }
    line
}

pub fn instructions(set: InstructionSet) -> String {
    let mut text = format!("{}\n", set.title());
    for (index, step) in set.steps().iter().enumerate() {
        let _ = writeln!(text, "  {}. {}", index + 1, step);
    }
    let note = set.note();
    if !note.is_empty() {
        let _ = writeln!(text, "\n{note}");
    }
    text
}

pub fn remote_status(status: &RemoteStatus) -> String {
    let mut text = format!("Remote: {}\n\n", status.describe());
    text.push_str(&instructions(InstructionSet::for_status(status)));
    text
}

/// Closing lines: outcome, timing, and what to do about a failure.
pub fn summary(view: &LinkViewModel, started: DateTime<Local>) -> String {
    let elapsed = Local::now().signed_duration_since(started);
    let seconds = elapsed.num_milliseconds() as f64 / 1000.0;
    if view.succeeded() {
        return format!(
            "[{:>3}%] Linked in {seconds:.1}s ({} steps, started {}).",
            view.progress_percent,
            view.steps.len(),
            started.format("%H:%M:%S")
        );
    }
    let mut text = format!("Link failed after {seconds:.1}s.");
    if let Some(failure) = &view.failure {
        let _ = write!(text, "\nHint: {}", failure.kind.hint());
    }
    text
}
