//! Chat handlers.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use goodpoints::{
    ChatFeedController, ChatView, Conversation, ConversationKey, DateBlock, Delivery, Message,
    SendOutcome, UserId,
};
use serde::Serialize;

use crate::output::{format_relative_time, format_time, map_blocks, PlainPrint, TableRow};

/// One message, ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRow {
    pub id: Option<u64>,
    pub from: String,
    pub is_mine: bool,
    pub text: String,
    pub time: DateTime<Utc>,
    pub views: u32,
    pub delivery: Delivery,
}

impl From<Message> for MessageRow {
    fn from(m: Message) -> Self {
        let from = if m.is_from_viewer {
            "You".to_string()
        } else {
            m.sender_name
                .as_ref()
                .map(|n| n.display())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Unknown".to_string())
        };

        Self {
            id: m.id.map(|id| id.get()),
            from,
            is_mine: m.is_from_viewer,
            text: m.text,
            time: m.timestamp,
            views: m.view_count,
            delivery: m.delivery,
        }
    }
}

impl MessageRow {
    fn status(&self) -> String {
        match self.delivery {
            Delivery::Pending => "sending".to_string(),
            Delivery::Failed => "not sent".to_string(),
            Delivery::Confirmed if self.is_mine => format!("seen {}", self.views),
            Delivery::Confirmed => String::new(),
        }
    }
}

impl TableRow for MessageRow {
    fn headers() -> Vec<&'static str> {
        vec!["Time", "From", "Message", "Status"]
    }
    fn row(&self) -> Vec<String> {
        vec![
            format_time(self.time),
            self.from.clone(),
            self.text.clone(),
            self.status(),
        ]
    }
}

impl PlainPrint for MessageRow {
    fn plain_print(&self) {
        let from_display = if self.is_mine {
            self.from.green().to_string()
        } else {
            self.from.cyan().to_string()
        };
        let status = match self.delivery {
            Delivery::Failed => self.status().red().to_string(),
            _ => self.status().dimmed().to_string(),
        };
        println!(
            "{} {} {}",
            format_time(self.time).dimmed(),
            from_display,
            status
        );
        for line in self.text.lines() {
            if !line.trim().is_empty() {
                println!("   {}", line);
            }
        }
    }
}

/// Conversation result.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationResult {
    pub conversation: String,
    pub has_more: bool,
    pub blocks: Vec<DateBlock<MessageRow>>,
    /// A later page failed; earlier pages are still shown.
    pub error: Option<String>,
}

impl ConversationResult {
    pub(crate) fn from_view(conversation: String, view: ChatView) -> Self {
        Self {
            conversation,
            has_more: view.has_more,
            blocks: map_blocks(view.blocks, MessageRow::from),
            error: view.error,
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.iter().map(DateBlock::len).sum()
    }
}

/// Send result.
#[derive(Debug, Clone, Serialize)]
pub struct SendResult {
    pub conversation: String,
    pub message: MessageRow,
    pub sent_ago: String,
}

/// Read the newest `pages` pages of a 1:1 conversation.
pub async fn read_conversation(
    chat: &ChatFeedController,
    base: &str,
    peer: UserId,
    pages: u32,
) -> Result<ConversationResult> {
    let key = ConversationKey::new(base, peer);
    let view = chat.load(Conversation::Direct(key.clone())).await;
    if let Some(error) = view.error.filter(|_| view.blocks.is_empty()) {
        bail!("Failed to load conversation {key}: {error}");
    }

    for _ in 1..pages {
        if !chat.view().has_more {
            break;
        }
        chat.load_older().await;
        if chat.view().is_error {
            break;
        }
    }

    Ok(ConversationResult::from_view(key.to_string(), chat.view()))
}

/// Send `text` to `peer`, optimistically.
pub async fn send_message(
    chat: &ChatFeedController,
    base: &str,
    peer: UserId,
    text: &str,
) -> Result<SendResult> {
    let key = ConversationKey::new(base, peer);
    let view = chat.load(Conversation::Direct(key.clone())).await;
    if let Some(error) = view.error {
        bail!("Failed to load conversation {key}: {error}");
    }

    settle(chat.send(text).await?, key.to_string())
}

pub(crate) fn settle(outcome: SendOutcome, conversation: String) -> Result<SendResult> {
    match outcome {
        SendOutcome::Sent(message) => {
            let message = MessageRow::from(message);
            Ok(SendResult {
                conversation,
                sent_ago: format_relative_time(message.time),
                message,
            })
        }
        SendOutcome::Failed(e) => {
            Err(e).with_context(|| format!("Message to {conversation} was not sent"))
        }
        SendOutcome::Skipped => bail!("Nothing to send: the message is blank"),
    }
}
