//! Subcommand definitions and their printers.

pub mod chat;
pub mod feed;
pub mod group;
