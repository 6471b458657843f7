//! Activity feed commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use goodpoints::{ListType, UserId};

use crate::config::build_authed_client;
use crate::handlers::activity_controller;
use crate::handlers::feed as handlers;
use crate::output::{print_blocks, print_note, OutputFormat};

#[derive(Subcommand)]
pub enum FeedAction {
    /// List a dated feed, newest first
    #[command(alias = "ls")]
    List {
        /// student-activity, teacher-activity or received-good-points
        list_type: ListType,
        /// Show another user's feed
        #[arg(short, long)]
        subject: Option<UserId>,
        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: u32,
    },
}

pub async fn handle(action: FeedAction, format: OutputFormat, verbose: bool) -> Result<()> {
    let client = build_authed_client()?;
    let feed = activity_controller(&client);

    match action {
        FeedAction::List {
            list_type,
            subject,
            pages,
        } => {
            let result = handlers::list_feed(&feed, list_type, subject, pages).await?;

            if let OutputFormat::Json = format {
                println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
                return Ok(());
            }

            if matches!(format, OutputFormat::Plain) {
                let whose = match subject {
                    Some(id) => format!(" for user {id}"),
                    None => String::new(),
                };
                println!("{}{}\n", list_type.as_str().green(), whose);
            }

            print_blocks(&result.blocks, format);

            if let Some(error) = &result.error {
                eprintln!("{} {}", "Could not load more:".red(), error);
            } else if result.has_more && verbose {
                print_note("More items available; pass --pages to load more.", format);
            }
            Ok(())
        }
    }
}
