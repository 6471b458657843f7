//! API modules.

mod account;
mod activity;
mod chat;

pub use account::AccountApi;
pub use activity::ActivityApi;
pub use chat::{ChatApi, DEFAULT_GROUP_BASE};
