//! TOP command - Public notes ranked by rating.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use reqwest::Client;

use super::{HumanReadable, Note, PageResponse, make_request, output, stars, truncate};

/// Arguments for the top command.
#[derive(Args)]
pub struct TopArgs {
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Notes per page (1 to 100)
    #[arg(long, default_value_t = 10)]
    pub limit: u32,
}

impl HumanReadable for PageResponse<Note> {
    fn print_human(&self) {
        println!("{}", "Top Rated Notes".green().bold());
        println!("{}", "=".repeat(60));
        println!();

        if self.items.is_empty() {
            println!("  {}", "(No rated notes yet)".dimmed());
            return;
        }

        let offset = u64::from(self.page.saturating_sub(1)) * u64::from(self.limit);
        for (i, note) in self.items.iter().enumerate() {
            println!(
                "  {:>3}. {} {:.1} ({})  {}",
                offset + i as u64 + 1,
                stars(note.average_rating).yellow(),
                note.average_rating,
                note.rating_count,
                truncate(&note.title, 40)
            );
            println!("       {}", note.id.to_string().dimmed());
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

/// Execute the top command.
pub async fn execute(client: &Client, base_url: &str, human: bool, args: TopArgs) -> Result<()> {
    let url = format!("{}/notes/top-rated", base_url);
    let request = client
        .get(&url)
        .query(&[("page", args.page), ("limit", args.limit)]);

    let response: PageResponse<Note> = make_request(request).await?;

    output(&response, human)
}
