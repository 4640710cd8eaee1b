//! READ command - Fetch a note with its rating summary.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use reqwest::Client;
use uuid::Uuid;

use super::{HumanReadable, Note, format_timestamp, make_request, output, stars};

/// Arguments for the read command.
#[derive(Args)]
pub struct ReadArgs {
    /// Note ID to read
    pub note_id: Uuid,

    /// Share token for a private note
    #[arg(short = 't', long = "share-token")]
    pub share_token: Option<String>,
}

impl HumanReadable for Note {
    fn print_human(&self) {
        println!("{}", self.title.green().bold());
        println!("{}", "=".repeat(60));
        println!();

        println!("  {} {}", "ID:".cyan(), self.id);
        println!("  {} {}", "Owner:".cyan(), self.owner_id);
        println!(
            "  {} {}",
            "Visibility:".cyan(),
            if self.is_public { "public" } else { "private" }
        );
        println!(
            "  {} {} {:.1} ({} ratings)",
            "Rating:".cyan(),
            stars(self.average_rating),
            self.average_rating,
            self.rating_count
        );
        println!("  {} {}", "Views:".cyan(), self.view_count);
        println!("  {} {}", "Updated:".cyan(), format_timestamp(&self.updated_at));

        if let Some(share) = &self.share {
            println!(
                "  {} {} (expires {})",
                "Share token:".cyan(),
                share.token,
                format_timestamp(&share.expires_at)
            );
        }

        println!();
        println!("{}", "Content:".yellow());
        println!("{}", "-".repeat(60));
        println!("{}", self.content);
        println!("{}", "-".repeat(60));

        if let Some(attachments) = self.attachments.as_ref().filter(|a| !a.is_empty()) {
            println!();
            println!("{}", "Attachments:".yellow());
            for a in attachments {
                println!(
                    "  {} {} ({}, {} bytes)",
                    "-".dimmed(),
                    a.file_name,
                    a.content_type,
                    a.size_bytes
                );
            }
        }
    }
}

/// Execute the read command.
pub async fn execute(client: &Client, base_url: &str, human: bool, args: ReadArgs) -> Result<()> {
    let url = format!("{}/notes/{}", base_url, args.note_id);

    let mut request = client.get(&url);
    if let Some(token) = &args.share_token {
        request = request.query(&[("token", token)]);
    }

    let response: Note = make_request(request).await?;

    output(&response, human)
}
