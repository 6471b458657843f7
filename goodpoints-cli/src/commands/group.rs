//! Group-send commands.

use anyhow::Result;
use clap::Subcommand;
use goodpoints::UserId;
use std::sync::Arc;

use super::chat::{print_conversation, print_sent};
use crate::config::{build_authed_client, session_store};
use crate::handlers::chat_controller;
use crate::handlers::group as handlers;
use crate::output::{print_note, OutputFormat};

#[derive(Subcommand)]
pub enum GroupAction {
    /// Show what this session sent to a set of students
    Show {
        /// Comma-separated student IDs
        #[arg(short, long, value_delimiter = ',', required = true)]
        students: Vec<UserId>,
    },

    /// Send one message to a set of students
    Send {
        /// Comma-separated student IDs
        #[arg(short, long, value_delimiter = ',', required = true)]
        students: Vec<UserId>,
        /// Message text
        text: String,
    },

    /// Forget the session's group draft
    Clear,
}

pub async fn handle(action: GroupAction, format: OutputFormat, verbose: bool) -> Result<()> {
    let client = build_authed_client()?;
    let chat = chat_controller(&client, Arc::new(session_store()?));

    match action {
        GroupAction::Show { students } => {
            let result = handlers::show_group(&chat, &students).await?;
            print_conversation(&result, format, verbose);
            Ok(())
        }
        GroupAction::Send { students, text } => {
            let result = handlers::send_group(&chat, &students, &text).await?;
            print_sent(&result, format);
            Ok(())
        }
        GroupAction::Clear => {
            handlers::clear_group(&chat)?;
            print_note("Group draft cleared.", format);
            Ok(())
        }
    }
}
