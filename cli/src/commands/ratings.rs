//! RATINGS command - List a note's ratings, or your own.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use reqwest::Client;
use uuid::Uuid;

use super::{HumanReadable, PageResponse, Rating, format_timestamp, make_request, output, truncate};

/// Arguments for the ratings command.
#[derive(Args)]
pub struct RatingsArgs {
    /// Note whose ratings to list; omit to list your own ratings
    pub note_id: Option<Uuid>,

    /// Share token for a private note
    #[arg(short = 't', long = "share-token")]
    pub share_token: Option<String>,

    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Ratings per page (1 to 100)
    #[arg(long, default_value_t = 10)]
    pub limit: u32,
}

impl HumanReadable for PageResponse<Rating> {
    fn print_human(&self) {
        println!("{}", "Ratings".green().bold());
        println!("{}", "=".repeat(60));
        println!();

        if self.items.is_empty() {
            println!("  {}", "(No ratings)".dimmed());
            return;
        }

        for rating in &self.items {
            println!(
                "  {} {}  {}",
                "*".repeat(usize::from(rating.value)).yellow(),
                rating.id.to_string().dimmed(),
                format_timestamp(&rating.updated_at)
            );
            if let Some(comment) = &rating.comment {
                println!("    {}", truncate(comment, 72));
            }
        }

        println!();
        println!(
            "  {} {} (page {} of {})",
            "Total:".cyan(),
            self.total,
            self.page,
            self.pages.max(1)
        );
    }
}

/// Execute the ratings command.
pub async fn execute(
    client: &Client,
    base_url: &str,
    human: bool,
    args: RatingsArgs,
) -> Result<()> {
    let url = match args.note_id {
        Some(note_id) => format!("{}/notes/{}/ratings", base_url, note_id),
        None => format!("{}/users/me/ratings", base_url),
    };

    let mut request = client
        .get(&url)
        .query(&[("page", args.page), ("limit", args.limit)]);
    if let Some(token) = &args.share_token {
        request = request.query(&[("token", token)]);
    }

    let response: PageResponse<Rating> = make_request(request).await?;

    output(&response, human)
}
