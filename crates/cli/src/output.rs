//! CLI output formatting utilities.
//!
//! Provides consistent formatting for terminal output including colored status
//! messages, task summaries, and Unicode symbols.

use std::time::Duration;

use owo_colors::{OwoColorize, Stream};

use octopus_lib::execute::{ExecutionSummary, TaskStatus};

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const SKIP: &str = "-";
  pub const PIN: &str = "@";
}

/// The abbreviated form of a commit id.
pub fn truncate_hash(hash: &str) -> &str {
  let len = hash.len().min(12);
  &hash[..len]
}

/// Elapsed time rounded to milliseconds.
pub fn format_duration(duration: Duration) -> String {
  let rounded = Duration::from_millis(duration.as_millis() as u64);
  humantime::format_duration(rounded).to_string()
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// One line per task, then the totals.
pub fn print_summary(summary: &ExecutionSummary, elapsed: Duration) {
  for task in &summary.tasks {
    match &task.status {
      TaskStatus::Succeeded { actions } => println!(
        "  {} {} {}",
        symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
        task.name,
        format!("({} action(s))", actions.len()).if_supports_color(Stream::Stdout, |s| s.dimmed())
      ),
      TaskStatus::Failed {
        action_index, error, ..
      } => print_error(&format!("{} failed at action {}: {}", task.name, action_index + 1, error)),
      TaskStatus::Skipped(reason) => println!(
        "  {} {} {}",
        symbols::SKIP.if_supports_color(Stream::Stdout, |s| s.yellow()),
        task.name,
        format!("(skipped: {reason})").if_supports_color(Stream::Stdout, |s| s.dimmed())
      ),
    }
  }

  println!();
  print_stat("Succeeded", &summary.succeeded().to_string());
  print_stat("Failed", &summary.failed().to_string());
  print_stat("Skipped", &summary.skipped().to_string());
  print_stat("Time", &format_duration(elapsed));
}
