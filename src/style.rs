//! Terminal styling utilities
//!
//! Consistent colors for progress lines. Uses crossterm for cross-platform
//! terminal colors.

use crate::types::{StepOutcome, StepStatus};
use crossterm::style::{StyledContent, Stylize};

/// Section headers
pub fn header(text: &str) -> StyledContent<String> {
    text.to_string().bold()
}

/// Dim/muted text
pub fn dim(text: &str) -> StyledContent<String> {
    text.to_string().dark_grey()
}

/// Success text
pub fn success(text: &str) -> StyledContent<String> {
    text.to_string().green()
}

/// Warning text
pub fn warning(text: &str) -> StyledContent<String> {
    text.to_string().yellow()
}

/// Error text
pub fn error(text: &str) -> StyledContent<String> {
    text.to_string().red()
}

/// URLs and repository names
pub fn highlight(text: &str) -> StyledContent<String> {
    text.to_string().cyan()
}

/// Path styling
pub fn path(p: &str) -> StyledContent<String> {
    p.to_string().blue()
}

/// Commands the user can copy and run
pub fn command(text: &str) -> StyledContent<String> {
    text.to_string().yellow().bold()
}

/// Marker for a publish step line
/// - completed: green check
/// - skipped: dim circle
pub fn step_indicator(outcome: &StepOutcome) -> StyledContent<&'static str> {
    match outcome.status {
        StepStatus::Completed => "✓".green(),
        StepStatus::Skipped { .. } => "○".dark_grey(),
    }
}

/// One line describing a publish step
pub fn step_line(outcome: &StepOutcome) -> String {
    match outcome.status {
        StepStatus::Completed => format!("{} git {}", step_indicator(outcome), outcome.step),
        StepStatus::Skipped { ref reason } => format!(
            "{} git {} {}",
            step_indicator(outcome),
            outcome.step,
            dim(&format!("(skipped: {})", reason))
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PublishStep;

    #[test]
    fn test_styles_keep_text() {
        assert!(success("done").to_string().contains("done"));
        assert!(error("failed").to_string().contains("failed"));
        assert!(command("git push -u origin main")
            .to_string()
            .contains("git push -u origin main"));
    }

    #[test]
    fn test_step_lines() {
        let line = step_line(&StepOutcome::completed(PublishStep::Push));
        assert!(line.contains("git push"));

        let line = step_line(&StepOutcome::skipped(PublishStep::Commit, "nothing to commit"));
        assert!(line.contains("git commit"));
        assert!(line.contains("skipped: nothing to commit"));
    }
}
