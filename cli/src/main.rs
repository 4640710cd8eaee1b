//! Command-line client for LooseNotes.
//!
//! Commands:
//! - create: Create a note
//! - read: Fetch a note (optionally through a share token)
//! - rate / unrate: Add, replace or remove a rating
//! - ratings: List a note's ratings, or your own
//! - share: Issue or revoke a share link
//! - delete: Delete a note
//! - top: Public notes ranked by rating
//!
//! Configuration via environment:
//! - LOOSENOTES_URL: Base URL of the server (default: http://localhost:3000)
//! - LOOSENOTES_TOKEN: JWT Bearer token for authentication

mod commands;

use clap::{Parser, Subcommand};

use commands::{
    create::CreateArgs, delete::DeleteArgs, rate::RateArgs, ratings::RatingsArgs,
    read::ReadArgs, share::ShareArgs, top::TopArgs, unrate::UnrateArgs,
};

/// LooseNotes CLI
///
/// Output is JSON by default; pass --human for formatted text.
#[derive(Parser)]
#[command(name = "loosenotes")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output human-readable formatted text instead of JSON
    #[arg(long, global = true)]
    human: bool,

    /// LooseNotes server URL
    #[arg(
        long,
        env = "LOOSENOTES_URL",
        default_value = "http://localhost:3000",
        global = true
    )]
    url: String,

    /// JWT Bearer token for authentication
    #[arg(long, env = "LOOSENOTES_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new note
    Create(CreateArgs),

    /// Read a note
    Read(ReadArgs),

    /// Rate a note from 1 to 5
    Rate(RateArgs),

    /// List ratings on a note, or your own
    Ratings(RatingsArgs),

    /// Remove one of your ratings
    Unrate(UnrateArgs),

    /// Manage a note's share link
    Share(ShareArgs),

    /// Delete a note
    Delete(DeleteArgs),

    /// Show the top-rated public notes
    Top(TopArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let client = match commands::build_client(cli.token.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let base_url = cli.url.trim_end_matches('/');
    let human = cli.human;

    let result = match cli.command {
        Commands::Create(args) => commands::create::execute(&client, base_url, human, args).await,
        Commands::Read(args) => commands::read::execute(&client, base_url, human, args).await,
        Commands::Rate(args) => commands::rate::execute(&client, base_url, human, args).await,
        Commands::Ratings(args) => {
            commands::ratings::execute(&client, base_url, human, args).await
        }
        Commands::Unrate(args) => commands::unrate::execute(&client, base_url, human, args).await,
        Commands::Share(args) => commands::share::execute(&client, base_url, human, args).await,
        Commands::Delete(args) => commands::delete::execute(&client, base_url, human, args).await,
        Commands::Top(args) => commands::top::execute(&client, base_url, human, args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn share_create_parses_ttl() {
        let cli = Cli::try_parse_from([
            "loosenotes",
            "share",
            "create",
            "6f1c2a52-9d1e-4c55-8f61-1d2b3c4d5e6f",
            "--ttl-days",
            "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Share(args) => match args.action {
                commands::share::ShareAction::Create { ttl_days, .. } => {
                    assert_eq!(ttl_days, Some(3));
                }
                _ => panic!("expected share create"),
            },
            _ => panic!("expected share"),
        }
    }

    #[test]
    fn rate_accepts_out_of_range_values_for_the_server_to_reject() {
        let cli = Cli::try_parse_from([
            "loosenotes",
            "rate",
            "6f1c2a52-9d1e-4c55-8f61-1d2b3c4d5e6f",
            "-1",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Rate(ref a) if a.value == -1));
    }
}
