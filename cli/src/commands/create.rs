//! CREATE command - Create a new note.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{HumanReadable, Note, format_timestamp, make_request, output};

/// Arguments for the create command.
#[derive(Args)]
pub struct CreateArgs {
    /// Title (3 to 100 characters)
    pub title: String,

    /// Note body; read from stdin when omitted
    #[arg(short, long)]
    pub content: Option<String>,

    /// Make the note visible to everyone
    #[arg(long)]
    pub public: bool,
}

/// Request body for creating a note.
#[derive(Serialize)]
struct CreateNoteRequest {
    title: String,
    content: String,
    is_public: bool,
}

/// Response from creating a note.
#[derive(Deserialize, Serialize)]
#[serde(transparent)]
pub struct CreatedNote(Note);

impl HumanReadable for CreatedNote {
    fn print_human(&self) {
        let note = &self.0;
        println!("{}", "Note created successfully!".green().bold());
        println!();
        println!("  {} {}", "ID:".cyan(), note.id);
        println!("  {} {}", "Title:".cyan(), note.title);
        println!(
            "  {} {}",
            "Visibility:".cyan(),
            if note.is_public { "public" } else { "private" }
        );
        println!("  {} {}", "Created:".cyan(), format_timestamp(&note.created_at));
    }
}

/// Execute the create command.
pub async fn execute(client: &Client, base_url: &str, human: bool, args: CreateArgs) -> Result<()> {
    let content = match args.content {
        Some(content) => content,
        None => std::io::read_to_string(std::io::stdin())
            .context("failed to read note body from stdin")?,
    };

    let url = format!("{}/notes", base_url);
    let request_body = CreateNoteRequest {
        title: args.title,
        content,
        is_public: args.public,
    };

    let response: CreatedNote = make_request(client.post(&url).json(&request_body)).await?;

    output(&response, human)
}
