//! Formatting functions for workflow output.
//!
//! `format_*` functions are pure and return the lines to print; `display_*` functions
//! print them with `console` styling.

use console::style;

use crate::component::Registry;
use crate::domain::ReleaseIntent;
use crate::workflow::{Artifact, Outcome};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

pub fn display_intent(intent: &ReleaseIntent, dry_run: bool) {
    let suffix = if dry_run { " (dry run)" } else { "" };
    println!("\n{}{}", style(intent.to_string()).bold(), style(suffix).dim());
}

/// Lines describing how a workflow ended
pub fn format_outcome(outcome: &Outcome) -> Vec<String> {
    match outcome {
        Outcome::Satisfied(evidence) => vec![format!("Nothing to do: {}", evidence)],
        Outcome::InProgress { branch } => vec![format!(
            "Nothing to do: branch {} already exists, another run is in progress",
            branch
        )],
        Outcome::Planned(actions) => {
            let mut lines = vec!["DRY RUN - no changes made. Would:".to_string()];
            lines.extend(actions.iter().map(|action| format!("  - {}", action)));
            lines
        }
        Outcome::Done(artifacts) => artifacts.iter().map(describe_artifact).collect(),
    }
}

fn describe_artifact(artifact: &Artifact) -> String {
    match artifact {
        Artifact::Branch { name, url } => format!("Created branch {}: {}", name, url),
        Artifact::Tag { name, commit } => format!("Created tag {} at {}", name, commit),
        Artifact::PullRequest { number, url } => format!("Opened pull request #{}: {}", number, url),
        Artifact::Release { tag, url } => format!("Created draft prerelease {}: {}", tag, url),
    }
}

/// Print an outcome: created artifacts as successes, everything else as status
pub fn display_outcome(outcome: &Outcome) {
    for line in format_outcome(outcome) {
        match outcome {
            Outcome::Done(_) => display_success(&line),
            _ => display_status(&line),
        }
    }
}

/// List registered components
pub fn display_components(registry: &Registry) {
    println!("{}", style("Registered components:").bold());
    for registration in registry.registrations() {
        let version = registration
            .version
            .map(|v| format!(" ({})", v))
            .unwrap_or_default();
        println!(
            "  - {}{}: {}",
            style(registration.name).cyan(),
            version,
            registration.description
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Evidence;

    #[test]
    fn test_format_planned_outcome() {
        let lines = format_outcome(&Outcome::Planned(vec![
            "create branch release/v1.16 at abc".to_string(),
        ]));
        assert_eq!(lines[0], "DRY RUN - no changes made. Would:");
        assert_eq!(lines[1], "  - create branch release/v1.16 at abc");
    }

    #[test]
    fn test_format_satisfied_outcome_names_evidence() {
        let lines = format_outcome(&Outcome::Satisfied(Evidence::OpenPullRequest {
            number: 7,
            url: "https://github.test/pull/7".to_string(),
        }));
        assert_eq!(
            lines,
            vec!["Nothing to do: pull request #7 is already open: https://github.test/pull/7"]
        );
    }

    #[test]
    fn test_format_done_outcome() {
        let lines = format_outcome(&Outcome::Done(vec![Artifact::Branch {
            name: "release/v1.16".to_string(),
            url: "https://github.test/tree/release/v1.16".to_string(),
        }]));
        assert_eq!(
            lines,
            vec!["Created branch release/v1.16: https://github.test/tree/release/v1.16"]
        );
    }

    #[test]
    fn test_display_functions_do_not_panic() {
        display_error("test error");
        display_success("test success");
        display_status("test status");
    }
}
