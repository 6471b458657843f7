//! Rust client and feed engine for the Good Points school messaging service.

pub mod api;
pub mod client;
pub mod error;
pub mod feed;
pub mod models;
pub mod store;

// Re-export main types
pub use client::{AuthInfo, GoodPointsClient, GoodPointsClientBuilder, HttpConfig};
pub use error::{Error, Result};

// Re-export commonly used models
pub use models::{
    Delivery, FeedItem, ListType, Message, MessageId, PersonName, ReceivedGoodPoint,
    StudentActivity, TeacherActivity, UserId,
};

// Re-export the feed engine
pub use feed::{
    group_by_day, ActivityFeedController, ActivityKey, ActivityView, ChatFeedController,
    ChatView, Conversation, ConversationKey, DateBlock, DraftSessionBuffer, FeedCache,
    FeedConfig, SendOutcome, StickyConfig, StickyDateController, StickyDateDriver,
    StickyDateState,
};

// Re-export API types
pub use api::{AccountApi, ActivityApi, ChatApi};

pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
