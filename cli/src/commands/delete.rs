//! DELETE command - Delete a note with its ratings and attachments.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{HumanReadable, output, send_empty};

/// Arguments for the delete command.
#[derive(Args)]
pub struct DeleteArgs {
    /// Note ID to delete
    pub note_id: Uuid,

    /// Skip confirmation prompt (for non-interactive use)
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Result of a deletion.
#[derive(Debug, Deserialize, Serialize)]
pub struct Deleted {
    pub note_id: Uuid,
    pub deleted: bool,
}

impl HumanReadable for Deleted {
    fn print_human(&self) {
        println!("{}", "Note deleted.".green().bold());
        println!();
        println!("  {} {}", "ID:".cyan(), self.note_id);
    }
}

/// Execute the delete command.
pub async fn execute(client: &Client, base_url: &str, human: bool, args: DeleteArgs) -> Result<()> {
    // Confirmation prompt for interactive use
    if human && !args.yes {
        eprint!(
            "{} Delete note {} and all of its ratings and attachments? [y/N] ",
            "Warning:".yellow().bold(),
            args.note_id
        );

        use std::io::Write;
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            eprintln!("Aborted.");
            return Ok(());
        }
    }

    let url = format!("{}/notes/{}", base_url, args.note_id);
    send_empty(client.delete(&url)).await?;

    output(
        &Deleted {
            note_id: args.note_id,
            deleted: true,
        },
        human,
    )
}
