//! Account API: per-viewer counters.

use async_trait::async_trait;
use std::sync::Arc;

use crate::{client::GoodPointsClientInner, error::Result, feed::UnreadCounter};

const RESET_UNREAD_PATH: &str = "user/reset-unread";

/// API for the viewer's own account state.
#[derive(Clone)]
pub struct AccountApi {
    client: Arc<GoodPointsClientInner>,
}

impl AccountApi {
    pub(crate) fn new(client: Arc<GoodPointsClientInner>) -> Self {
        Self { client }
    }

    /// Zero the unread good-points counter.
    pub async fn reset_unread(&self) -> Result<()> {
        self.client
            .post_ignored(RESET_UNREAD_PATH, &serde_json::json!({}))
            .await
    }
}

impl std::fmt::Debug for AccountApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountApi").finish()
    }
}

#[async_trait]
impl UnreadCounter for AccountApi {
    async fn reset_unread_count(&self) -> Result<()> {
        self.reset_unread().await
    }
}
