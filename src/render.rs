//! Console rendering of session snapshots

use crate::reasoning::SessionResult;
use std::fmt::Write;

/// Render every step of a snapshot followed by the running thinking time.
///
/// The final answer gets a `### Final Answer` heading; other steps are
/// printed as `{label}:` followed by their content.
#[must_use]
pub fn render_snapshot(snapshot: &SessionResult) -> String {
    let mut out = String::new();
    for step in &snapshot.steps {
        if step.is_final_answer() {
            let _ = writeln!(out, "### {}", step.label);
        } else {
            let _ = writeln!(out, "{}:", step.label);
        }
        let _ = writeln!(out, "{}", step.content);
    }
    let _ = writeln!(
        out,
        "**Total thinking time so far: {:.2} seconds**",
        snapshot.total_elapsed_secs()
    );
    out
}

/// Render a completed session with per-step timings.
#[must_use]
pub fn render_summary(result: &SessionResult) -> String {
    let mut out = String::new();
    for step in &result.steps {
        if step.is_final_answer() {
            let _ = writeln!(out, "### {} ({:.2}s)", step.label, step.elapsed_secs());
        } else {
            let _ = writeln!(out, "{} ({:.2}s):", step.label, step.elapsed_secs());
        }
        let _ = writeln!(out, "{}", step.content);
    }
    let _ = writeln!(
        out,
        "**Total thinking time: {:.2} seconds**",
        result.total_elapsed_secs()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::{StepRecord, FINAL_ANSWER_LABEL};
    use std::time::Duration;

    fn sample() -> SessionResult {
        SessionResult {
            steps: vec![
                StepRecord {
                    label: "Step 1: Compute".to_string(),
                    content: "2+2=4".to_string(),
                    elapsed: Duration::from_millis(1250),
                },
                StepRecord {
                    label: FINAL_ANSWER_LABEL.to_string(),
                    content: "The answer is 4".to_string(),
                    elapsed: Duration::from_millis(500),
                },
            ],
            total_elapsed: Duration::from_millis(1750),
        }
    }

    #[test]
    fn test_render_snapshot() {
        assert_eq!(
            render_snapshot(&sample()),
            "Step 1: Compute:\n2+2=4\n### Final Answer\nThe answer is 4\n\
             **Total thinking time so far: 1.75 seconds**\n"
        );
    }

    #[test]
    fn test_render_snapshot_empty() {
        assert_eq!(
            render_snapshot(&SessionResult::default()),
            "**Total thinking time so far: 0.00 seconds**\n"
        );
    }

    #[test]
    fn test_render_summary_includes_step_times() {
        let text = render_summary(&sample());
        assert!(text.contains("Step 1: Compute (1.25s):\n2+2=4\n"));
        assert!(text.contains("### Final Answer (0.50s)\nThe answer is 4\n"));
        assert!(text.ends_with("**Total thinking time: 1.75 seconds**\n"));
    }
}
