//! Chat commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use goodpoints::UserId;
use std::sync::Arc;

use crate::config::{build_authed_client, session_store};
use crate::handlers::chat::{self as handlers, ConversationResult, SendResult};
use crate::handlers::chat_controller;
use crate::output::{print_blocks, print_note, OutputFormat, PlainPrint};

#[derive(Subcommand)]
pub enum ChatAction {
    /// Read a 1:1 conversation, newest first
    #[command(alias = "r")]
    Read {
        /// Conversation collection path, e.g. chat/student
        base: String,
        /// The other party's user ID
        peer: UserId,
        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: u32,
    },

    /// Send a message in a 1:1 conversation
    Send {
        /// Conversation collection path, e.g. chat/student
        base: String,
        /// The other party's user ID
        peer: UserId,
        /// Message text
        text: String,
    },
}

pub async fn handle(action: ChatAction, format: OutputFormat, verbose: bool) -> Result<()> {
    let client = build_authed_client()?;
    let chat = chat_controller(&client, Arc::new(session_store()?));

    match action {
        ChatAction::Read { base, peer, pages } => {
            let result = handlers::read_conversation(&chat, &base, peer, pages).await?;
            print_conversation(&result, format, verbose);
            Ok(())
        }
        ChatAction::Send { base, peer, text } => {
            let result = handlers::send_message(&chat, &base, peer, &text).await?;
            print_sent(&result, format);
            Ok(())
        }
    }
}

pub(crate) fn print_conversation(
    result: &ConversationResult,
    format: OutputFormat,
    verbose: bool,
) {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(result).unwrap_or_default());
        return;
    }

    if matches!(format, OutputFormat::Plain) {
        println!(
            "{} ({} messages)\n",
            result.conversation.green(),
            result.len()
        );
    }

    print_blocks(&result.blocks, format);

    if let Some(error) = &result.error {
        eprintln!("{} {}", "Could not load older messages:".red(), error);
    } else if result.has_more && verbose {
        print_note("Older messages available; pass --pages to load more.", format);
    }
}

pub(crate) fn print_sent(result: &SendResult, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result).unwrap_or_default());
        }
        OutputFormat::Plain | OutputFormat::Table => {
            println!("{} {}", "Sent to".green(), result.conversation);
            result.message.plain_print();
        }
    }
}
