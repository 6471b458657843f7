//! Activity feed handlers.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use goodpoints::{ActivityFeedController, DateBlock, FeedItem, ListType, UserId};
use serde::Serialize;

use crate::output::{format_time, map_blocks, PlainPrint, TableRow};

/// One feed item, ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct FeedRow {
    pub id: u64,
    /// The other party: student, colleague or sender.
    pub who: String,
    /// Teacher who sent it, when the feed says so.
    pub by: Option<String>,
    pub text: String,
    pub time: DateTime<Utc>,
    pub reactions: Option<u32>,
}

impl From<FeedItem> for FeedRow {
    fn from(item: FeedItem) -> Self {
        match item {
            FeedItem::StudentActivity(a) => Self {
                id: a.id.get(),
                who: a.student_name,
                by: a.teacher_name,
                text: a.text,
                time: a.timestamp,
                reactions: None,
            },
            FeedItem::TeacherActivity(a) => Self {
                id: a.id.get(),
                who: a.receiver_name,
                by: None,
                text: a.text,
                time: a.timestamp,
                reactions: None,
            },
            FeedItem::ReceivedGoodPoints(a) => Self {
                id: a.id.get(),
                who: a.sender_name,
                by: None,
                text: a.text,
                time: a.timestamp,
                reactions: Some(a.reaction_count),
            },
        }
    }
}

impl TableRow for FeedRow {
    fn headers() -> Vec<&'static str> {
        vec!["Time", "Who", "Good point", "By"]
    }
    fn row(&self) -> Vec<String> {
        vec![
            format_time(self.time),
            self.who.clone(),
            self.text.clone(),
            self.by.clone().unwrap_or_default(),
        ]
    }
}

impl PlainPrint for FeedRow {
    fn plain_print(&self) {
        let by = self
            .by
            .as_ref()
            .map(|b| format!(" (by {b})"))
            .unwrap_or_default();
        let reactions = match self.reactions {
            Some(n) if n > 0 => format!(" ♥ {n}"),
            _ => String::new(),
        };
        println!(
            "{} {}{}{}",
            format_time(self.time).dimmed(),
            self.who.cyan(),
            by.dimmed(),
            reactions.red()
        );
        println!("   {}", self.text);
    }
}

/// Feed result.
#[derive(Debug, Clone, Serialize)]
pub struct FeedResult {
    pub list_type: ListType,
    pub subject: Option<UserId>,
    pub has_more: bool,
    pub blocks: Vec<DateBlock<FeedRow>>,
    /// A later page failed; earlier pages are still shown.
    pub error: Option<String>,
}

/// List the newest `pages` pages of a feed.
pub async fn list_feed(
    feed: &ActivityFeedController,
    list_type: ListType,
    subject: Option<UserId>,
    pages: u32,
) -> Result<FeedResult> {
    let view = feed.load(subject, list_type).await;
    if let Some(error) = view.error.filter(|_| view.blocks.is_empty()) {
        bail!("Failed to load {list_type} feed: {error}");
    }

    for _ in 1..pages {
        if !feed.has_more() {
            break;
        }
        feed.fetch_next().await;
        if feed.is_error() {
            break;
        }
    }

    let view = feed.view();
    Ok(FeedResult {
        list_type,
        subject,
        has_more: view.has_more,
        blocks: map_blocks(view.blocks, FeedRow::from),
        error: view.error,
    })
}
