//! RATE command - Rate a note from 1 to 5 stars.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Aggregate, HumanReadable, Rating, make_request, output, stars};

/// Arguments for the rate command.
#[derive(Args)]
pub struct RateArgs {
    /// Note ID to rate
    pub note_id: Uuid,

    /// Stars, 1 to 5 (the server rejects anything else)
    #[arg(allow_negative_numbers = true)]
    pub value: i64,

    /// Optional comment, up to 500 characters
    #[arg(short, long)]
    pub comment: Option<String>,
}

/// Request body for rating a note.
#[derive(Serialize)]
struct RateRequest {
    value: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
}

/// Response from rating a note.
#[derive(Debug, Deserialize, Serialize)]
pub struct RateResponse {
    pub rating: Rating,
    pub aggregate: Aggregate,
}

impl HumanReadable for RateResponse {
    fn print_human(&self) {
        println!("{}", "Rating saved!".green().bold());
        println!();
        println!("  {} {}", "Rating ID:".cyan(), self.rating.id);
        println!(
            "  {} {}",
            "Your rating:".cyan(),
            stars(f64::from(self.rating.value))
        );
        if let Some(comment) = &self.rating.comment {
            println!("  {} {}", "Comment:".cyan(), comment);
        }
        println!(
            "  {} {:.1} from {} ratings",
            "Note average:".cyan(),
            self.aggregate.average_rating,
            self.aggregate.rating_count
        );
    }
}

/// Execute the rate command.
pub async fn execute(client: &Client, base_url: &str, human: bool, args: RateArgs) -> Result<()> {
    let url = format!("{}/notes/{}/ratings", base_url, args.note_id);
    let request_body = RateRequest {
        value: args.value,
        comment: args.comment,
    };

    let response: RateResponse = make_request(client.post(&url).json(&request_body)).await?;

    output(&response, human)
}
