//! UNRATE command - Remove a rating.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Aggregate, HumanReadable, make_request, output};

/// Arguments for the unrate command.
#[derive(Args)]
pub struct UnrateArgs {
    /// Rating ID to remove
    pub rating_id: Uuid,
}

/// Response from removing a rating.
#[derive(Debug, Deserialize, Serialize)]
pub struct RemovedRating {
    pub rating_id: Uuid,
    pub aggregate: Aggregate,
}

impl HumanReadable for RemovedRating {
    fn print_human(&self) {
        println!("{}", "Rating removed.".green().bold());
        println!();
        println!("  {} {}", "Rating ID:".cyan(), self.rating_id);
        println!(
            "  {} {:.1} from {} ratings",
            "Note average:".cyan(),
            self.aggregate.average_rating,
            self.aggregate.rating_count
        );
    }
}

/// Execute the unrate command.
pub async fn execute(client: &Client, base_url: &str, human: bool, args: UnrateArgs) -> Result<()> {
    let url = format!("{}/ratings/{}", base_url, args.rating_id);

    let response: RemovedRating = make_request(client.delete(&url)).await?;

    output(&response, human)
}
