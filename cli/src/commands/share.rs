//! SHARE command - Issue or revoke a note's share link.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use colored::Colorize;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{HumanReadable, format_timestamp, make_request, output, send_empty};

/// Arguments for the share command.
#[derive(Args)]
pub struct ShareArgs {
    #[command(subcommand)]
    pub action: ShareAction,
}

#[derive(Subcommand)]
pub enum ShareAction {
    /// Issue a new share token, replacing any existing one
    Create {
        /// Note ID to share
        note_id: Uuid,

        /// Token lifetime in days (server default when omitted)
        #[arg(long)]
        ttl_days: Option<i64>,
    },

    /// Revoke the note's share token
    Revoke {
        /// Note ID to stop sharing
        note_id: Uuid,
    },
}

/// Request body for issuing a share token.
#[derive(Serialize)]
struct ShareRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl_days: Option<i64>,
}

/// Response from issuing a share token.
#[derive(Debug, Deserialize, Serialize)]
pub struct ShareLink {
    pub token: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of a revocation.
#[derive(Debug, Deserialize, Serialize)]
pub struct Revoked {
    pub note_id: Uuid,
    pub revoked: bool,
}

impl HumanReadable for ShareLink {
    fn print_human(&self) {
        println!("{}", "Share link created!".green().bold());
        println!();
        println!("  {} {}", "URL:".cyan(), self.url);
        println!("  {} {}", "Expires:".cyan(), format_timestamp(&self.expires_at));
        println!();
        println!(
            "  {}",
            "Anyone with this link can read the note until it expires or is revoked.".dimmed()
        );
    }
}

impl HumanReadable for Revoked {
    fn print_human(&self) {
        println!("{}", "Share link revoked.".green().bold());
        println!();
        println!("  {} {}", "Note:".cyan(), self.note_id);
    }
}

/// Execute the share command.
pub async fn execute(client: &Client, base_url: &str, human: bool, args: ShareArgs) -> Result<()> {
    match args.action {
        ShareAction::Create { note_id, ttl_days } => {
            let url = format!("{}/notes/{}/share", base_url, note_id);
            let request_body = ShareRequest { ttl_days };
            let response: ShareLink = make_request(client.post(&url).json(&request_body)).await?;
            output(&response, human)
        }

        ShareAction::Revoke { note_id } => {
            let url = format!("{}/notes/{}/share", base_url, note_id);
            send_empty(client.delete(&url)).await?;
            output(
                &Revoked {
                    note_id,
                    revoked: true,
                },
                human,
            )
        }
    }
}
