//! Feed engine: paginated caches, date grouping and the screen controllers
//! that merge them with local state.

pub mod activity;
pub mod cache;
pub mod chat;
pub mod config;
pub mod draft;
pub mod grouper;
pub mod sticky;

pub use activity::{ActivityFeedController, ActivityKey, ActivityView, UnreadCounter};
pub use cache::{
    FeedCache, FeedCacheEntry, Observer, Page, PageFetcher, PageParam, PeripheralCache,
};
pub use chat::{
    ChatFeedController, ChatView, Conversation, ConversationKey, MessageRef, MessageSender,
    ScrollAnchor, SendOutcome,
};
pub use config::{FeedConfig, Layout, StickyConfig, DEFAULT_DRAFT_KEY, DEFAULT_FETCH_LIMIT};
pub use draft::{DraftEntry, DraftSessionBuffer};
pub use grouper::{group_by_day, group_by_day_in, DateBlock, Dated};
pub use sticky::{StickyDateController, StickyDateDriver, StickyDateState};
