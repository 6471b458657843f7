//! Shared handlers: wire the library's controllers to the HTTP client.

pub mod chat;
pub mod feed;
pub mod group;

use goodpoints::{
    feed::PageFetcher, ActivityFeedController, ChatFeedController, ConversationKey,
    DraftSessionBuffer, FeedCache, FeedConfig, GoodPointsClient, Message, SessionStore,
};
use std::sync::Arc;

/// Chat controller backed by `client`, with group drafts kept in `store`.
pub fn chat_controller(
    client: &GoodPointsClient,
    store: Arc<dyn SessionStore>,
) -> ChatFeedController {
    let config = FeedConfig::default();
    tracing::debug!(base_url = %client.config().base_url, "building chat controller");
    let api = Arc::new(client.chat());

    let cache = Arc::new(FeedCache::new(
        api.clone() as Arc<dyn PageFetcher<ConversationKey, Message>>,
        config.fetch_limit,
    ));
    let drafts = DraftSessionBuffer::new(store, config.draft_storage_key.clone());

    ChatFeedController::new(cache, drafts, api, &config)
}

/// Activity controller backed by `client`.
pub fn activity_controller(client: &GoodPointsClient) -> ActivityFeedController {
    let config = FeedConfig::default();
    tracing::debug!(base_url = %client.config().base_url, "building activity controller");
    let cache = client.activity().per_page(config.fetch_limit).into_cache();

    ActivityFeedController::new(Arc::new(cache), Arc::new(client.account()), config.sticky)
}
