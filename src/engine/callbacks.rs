//! Terminal implementations of the executor callbacks

use anyhow::Result;
use colored::Colorize;
use declarative::{ApplyResult, ConfirmCallback, ProgressCallback};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar over each batch, with one line per finished user
pub struct BarProgress {
    bar: Option<ProgressBar>,
    verbose: bool,
}

impl BarProgress {
    pub fn new(verbose: bool) -> Self {
        Self { bar: None, verbose }
    }

    fn print(&self, line: &str) {
        match &self.bar {
            Some(bar) => bar.suspend(|| println!("{line}")),
            None => println!("{line}"),
        }
    }
}

/// One status line for a finished resource; `None` when not worth showing
pub fn result_line(id: &str, result: &ApplyResult, verbose: bool) -> Option<String> {
    let line = match result {
        ApplyResult::NoChange if !verbose => return None,
        ApplyResult::NoChange => format!("  {} {} {}", "○".dimmed(), id, "unchanged".dimmed()),
        ApplyResult::Created { properties } => format!(
            "  {} {} {}",
            "+".green(),
            id,
            format!("created ({properties} properties)").dimmed()
        ),
        ApplyResult::Modified { properties } => format!(
            "  {} {} {}",
            "~".yellow(),
            id,
            format!("modified ({properties} properties)").dimmed()
        ),
        ApplyResult::Failed { error } => format!("  {} {} {}", "✗".red(), id, error.red()),
        ApplyResult::Skipped { reason } => {
            format!("  {} {} {}", "⊘".dimmed(), id, reason.dimmed())
        }
    };
    Some(line)
}

impl ProgressCallback for BarProgress {
    fn on_batch_start(&mut self, count: usize, privileged: bool) {
        let bar = ProgressBar::new(count as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.red} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        if privileged {
            bar.set_prefix("sudo");
        }
        self.bar = Some(bar);
    }

    fn on_resource_start(&mut self, _id: &str, description: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(description.to_string());
        }
    }

    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult) {
        if let Some(line) = result_line(id, result, self.verbose) {
            self.print(&line);
        }
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn on_batch_complete(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Interactive yes/no prompt, skipped with `--yes`
pub struct PromptConfirm {
    assume_yes: bool,
}

impl PromptConfirm {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }

        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()?;

        Ok(confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_lines() {
        colored::control::set_override(false);

        assert_eq!(result_line("alice", &ApplyResult::NoChange, false), None);
        assert_eq!(
            result_line("alice", &ApplyResult::NoChange, true).as_deref(),
            Some("  ○ alice unchanged")
        );
        assert_eq!(
            result_line("alice", &ApplyResult::Created { properties: 5 }, false).as_deref(),
            Some("  + alice created (5 properties)")
        );
        assert_eq!(
            result_line(
                "bob",
                &ApplyResult::Failed {
                    error: "usermod: user bob is currently used by process 42".into()
                },
                false
            )
            .as_deref(),
            Some("  ✗ bob usermod: user bob is currently used by process 42")
        );
    }

    #[test]
    fn test_assume_yes_skips_prompt() {
        assert!(PromptConfirm::new(true).confirm("Apply changes?").unwrap());
    }

    #[test]
    fn test_progress_without_batch() {
        let mut progress = BarProgress::new(false);
        progress.on_resource_complete("ghost", &ApplyResult::NoChange);
        progress.on_batch_start(2, true);
        progress.on_resource_start("alice", "User account alice");
        progress.on_resource_complete("alice", &ApplyResult::Modified { properties: 1 });
        progress.on_batch_complete();
        assert!(progress.bar.is_none());
    }
}
