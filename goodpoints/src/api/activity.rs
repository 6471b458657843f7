//! Activity feed API.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::{
    client::GoodPointsClientInner,
    error::Result,
    feed::{ActivityKey, FeedCache, PageFetcher, PageParam, DEFAULT_FETCH_LIMIT},
    models::FeedItem,
};

/// API for the dated good-point feeds.
#[derive(Clone)]
pub struct ActivityApi {
    client: Arc<GoodPointsClientInner>,
    per_page: usize,
}

impl ActivityApi {
    pub(crate) fn new(client: Arc<GoodPointsClientInner>) -> Self {
        Self {
            client,
            per_page: DEFAULT_FETCH_LIMIT,
        }
    }

    /// Set the `perPage` sent with every request.
    pub fn per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    pub fn page_size(&self) -> usize {
        self.per_page
    }

    /// Cache over this API whose page limit is the requested page size, so a
    /// short page really means the feed has ended.
    pub fn into_cache(self) -> FeedCache<ActivityKey, FeedItem> {
        let limit = self.per_page;
        FeedCache::new(Arc::new(self), limit)
    }

    /// Get one page of a feed, newest first.
    pub async fn list(&self, key: &ActivityKey, page: u32) -> Result<Vec<FeedItem>> {
        let raw: Vec<Value> = self
            .client
            .get_json(&key.path(), &page_query(page, self.per_page))
            .await?;

        parse_items(key, raw)
    }
}

impl std::fmt::Debug for ActivityApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityApi")
            .field("per_page", &self.per_page)
            .finish()
    }
}

fn page_query(page: u32, per_page: usize) -> [(&'static str, String); 2] {
    [
        ("pageNumber", page.to_string()),
        ("perPage", per_page.to_string()),
    ]
}

fn parse_items(key: &ActivityKey, raw: Vec<Value>) -> Result<Vec<FeedItem>> {
    raw.into_iter()
        .map(|value| FeedItem::from_json(key.list_type, value))
        .collect()
}

#[async_trait]
impl PageFetcher<ActivityKey, FeedItem> for ActivityApi {
    async fn fetch_page(&self, key: &ActivityKey, page: PageParam) -> Result<Vec<FeedItem>> {
        self.list(key, page.index()).await
    }
}
