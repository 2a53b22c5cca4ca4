//! Diff display

use crate::ui;
use colored::Colorize;
use declarative::{DiffSummary, ResourceDiff};

/// Display a list of diffs in a user-friendly format
pub fn display_diff(diffs: &[ResourceDiff]) {
    if diffs.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Account Diff".bold()
    );
    println!("│");

    for diff in diffs {
        let symbol = if diff.is_addition() {
            "+".green()
        } else {
            "~".yellow()
        };
        let sudo_indicator = if diff.requires_sudo {
            " [sudo]".red().to_string()
        } else {
            String::new()
        };
        let state_desc = if diff.is_addition() {
            "(new account)"
        } else {
            ""
        };

        println!(
            "│ {} {:<30} {}{}",
            symbol,
            format!("{}[{}]", diff.resource_type, diff.resource_id).bold(),
            state_desc.dimmed(),
            sudo_indicator
        );

        for change in &diff.changes {
            println!(
                "│     {:<10} {} → {}",
                change.property,
                ui::actual(change.from.as_ref()),
                ui::value(&change.to)
            );
        }
        println!("│");
    }

    let summary = DiffSummary::from_diffs(diffs);
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} to create, {} to modify, {} properties ({} require sudo)",
        summary.additions.to_string().green(),
        summary.modifications.to_string().yellow(),
        summary.property_changes.to_string().bold(),
        summary.sudo_required.to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

/// Display the sudo boundary warning
pub fn display_sudo_boundary(privileged_diffs: &[&ResourceDiff]) {
    if privileged_diffs.is_empty() {
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Privilege Boundary".yellow().bold()
    );
    println!("│");
    println!(
        "│  {}  The following {} accounts require sudo:",
        "⚠".yellow(),
        privileged_diffs.len()
    );
    println!("│");

    for diff in privileged_diffs.iter().take(10) {
        println!("│  • {}", diff.description);
    }

    if privileged_diffs.len() > 10 {
        println!("│  • ... and {} more", privileged_diffs.len() - 10);
    }

    println!("│");
    println!("│  Sudo will be requested once and released immediately after.");
    println!("│");
    println!("└─────────────────────────────────────────────────────────────┘");
}
