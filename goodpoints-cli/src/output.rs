//! Output formatting.

use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use goodpoints::DateBlock;
use serde::Serialize;

/// Output format options.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table format
    Table,
    /// JSON format
    Json,
    /// Plain text format
    #[default]
    Plain,
}

/// Trait for plain text output.
pub trait PlainPrint {
    /// Print as plain text with formatting.
    fn plain_print(&self);
}

/// Trait for table row generation.
pub trait TableRow {
    /// Get table headers.
    fn headers() -> Vec<&'static str>;
    /// Get row data as strings.
    fn row(&self) -> Vec<String>;
}

/// Format a timestamp as local wall-clock time.
pub fn format_time(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

/// Format a time relative to now.
pub fn format_relative_time(timestamp: DateTime<Utc>) -> String {
    relative_to(timestamp, Utc::now())
}

fn relative_to(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (now - timestamp).num_seconds();

    if diff < 0 {
        "just now".to_string()
    } else if diff < 60 {
        format!("{}s ago", diff)
    } else if diff < 3600 {
        format!("{}m ago", diff / 60)
    } else if diff < 86400 {
        format!("{}h {}m ago", diff / 3600, (diff % 3600) / 60)
    } else {
        format!("{}d ago", diff / 86400)
    }
}

/// Format a block's day for its header.
pub fn format_day(day: NaiveDate) -> String {
    let today = Local::now().date_naive();
    if day == today {
        "Today".to_string()
    } else if today.pred_opt() == Some(day) {
        "Yesterday".to_string()
    } else {
        day.format("%A, %d %B %Y").to_string()
    }
}

/// Print date-grouped items, one header per block in plain mode.
pub fn print_blocks<T: TableRow + Serialize + PlainPrint>(
    blocks: &[DateBlock<T>],
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(blocks).unwrap_or_default());
        }
        OutputFormat::Table => {
            if blocks.is_empty() {
                println!("No results");
                return;
            }
            let mut table = Table::new();
            table.load_preset(UTF8_FULL_CONDENSED);
            table.set_content_arrangement(ContentArrangement::Dynamic);

            let mut headers = vec!["Day"];
            headers.extend(T::headers());
            table.set_header(headers);

            for block in blocks {
                let day = format_day(block.day);
                for item in &block.items {
                    let mut row = vec![day.clone()];
                    row.extend(item.row());
                    table.add_row(row);
                }
            }
            println!("{table}");
        }
        OutputFormat::Plain => {
            if blocks.is_empty() {
                println!("No results");
                return;
            }
            for block in blocks {
                println!("── {} ──", format_day(block.day).bold());
                for item in &block.items {
                    item.plain_print();
                }
            }
        }
    }
}

/// Regroup already-grouped items into display rows.
pub fn map_blocks<T, R>(blocks: Vec<DateBlock<T>>, f: impl Fn(T) -> R) -> Vec<DateBlock<R>> {
    blocks
        .into_iter()
        .map(|block| DateBlock {
            day: block.day,
            items: block.items.into_iter().map(&f).collect(),
        })
        .collect()
}

/// Print a one-line status message, dimmed in plain mode.
pub fn print_note(message: &str, format: OutputFormat) {
    match format {
        OutputFormat::Plain => println!("{}", message.dimmed()),
        // Keep stdout machine-readable.
        OutputFormat::Json | OutputFormat::Table => eprintln!("{message}"),
    }
}
