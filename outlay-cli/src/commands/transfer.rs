//! Transfer commands - export and import the active collection

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use dialoguer::Confirm;

use outlay_core::services::transfer;

use crate::output;

use super::{get_user_context, read_stdin};

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

pub fn run_export(format: ExportFormat, output_path: Option<PathBuf>) -> Result<()> {
    let ctx = get_user_context()?;
    let snapshot = ctx.store.snapshot();

    let content = match format {
        ExportFormat::Json => transfer::export_json(&snapshot)?,
        ExportFormat::Csv => transfer::export_csv(&snapshot)?,
    };

    match output_path {
        Some(path) => {
            std::fs::write(&path, content)
                .with_context(|| format!("Failed to write {:?}", path))?;
            // Report on stderr so stdout stays usable in pipelines
            eprintln!(
                "{} Exported {} expenses to {}",
                "✓".green(),
                snapshot.len(),
                path.display()
            );
        }
        None => println!("{}", content),
    }
    Ok(())
}

pub fn run_import(file: Option<PathBuf>, yes: bool, json: bool) -> Result<()> {
    let mut ctx = get_user_context()?;

    // Read from file argument, or stdin when absent or `-`
    let payload = match file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {:?}", path))?,
        _ => read_stdin()?,
    };

    // Validate before asking anything
    let expenses = transfer::parse_import(&payload)?;
    let existing = ctx.store.snapshot().len();

    match replace_approval(existing, yes, json, atty::is(atty::Stream::Stdin)) {
        Approval::NotNeeded => {}
        Approval::Refused => anyhow::bail!(
            "Refusing to replace {} existing expenses without a prompt; pass --yes",
            existing
        ),
        Approval::Prompt => {
            // Prompt text stays off stdout
            eprintln!(
                "\n{}",
                format!(
                    "This will replace your {} expenses with {} imported ones.",
                    existing,
                    expenses.len()
                )
                .yellow()
            );
            if !Confirm::new()
                .with_prompt("Are you sure?")
                .default(false)
                .interact()?
            {
                eprintln!("{}\n", "Cancelled".dimmed());
                return Ok(());
            }
        }
    }

    let count = expenses.len();
    let persisted = ctx.store.import_all(expenses)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "imported": count,
                "replaced": existing,
                "persisted": persisted,
            }))?
        );
        return Ok(());
    }

    output::success(&format!("Imported {} expenses (replaced {})", count, existing));
    if !persisted {
        output::warning("Storage is unavailable; the imported expenses are not saved");
    }
    Ok(())
}

/// How replacing existing expenses gets approved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Approval {
    NotNeeded,
    Prompt,
    Refused,
}

/// A prompt needs an interactive stdin and is never mixed into JSON output
fn replace_approval(existing: usize, yes: bool, json: bool, interactive: bool) -> Approval {
    if yes || existing == 0 {
        Approval::NotNeeded
    } else if json || !interactive {
        Approval::Refused
    } else {
        Approval::Prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_approval() {
        assert_eq!(replace_approval(0, false, false, false), Approval::NotNeeded);
        assert_eq!(replace_approval(3, true, true, false), Approval::NotNeeded);
        assert_eq!(replace_approval(3, false, false, true), Approval::Prompt);
    }

    #[test]
    fn test_replace_without_yes_refused_for_json_or_piped_input() {
        assert_eq!(replace_approval(3, false, true, true), Approval::Refused);
        assert_eq!(replace_approval(3, false, false, false), Approval::Refused);
        assert_eq!(replace_approval(3, false, true, false), Approval::Refused);
    }
}
