//! Chat API: 1:1 history pages and message sends.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::{
    client::GoodPointsClientInner,
    error::Result,
    feed::{ConversationKey, MessageSender, PageFetcher, PageParam},
    models::{participant_set, Message, UserId},
};

/// Default collection path for group sends.
pub const DEFAULT_GROUP_BASE: &str = "chat/group";

/// API for chat history and sends.
#[derive(Clone)]
pub struct ChatApi {
    client: Arc<GoodPointsClientInner>,
    group_base: String,
}

impl ChatApi {
    pub(crate) fn new(client: Arc<GoodPointsClientInner>) -> Self {
        Self {
            client,
            group_base: DEFAULT_GROUP_BASE.to_owned(),
        }
    }

    /// Post group sends to `base` instead of the default collection.
    pub fn group_base(mut self, base: impl Into<String>) -> Self {
        self.group_base = base.into();
        self
    }

    /// Get one page of a conversation's history, newest first.
    pub async fn history(&self, key: &ConversationKey, page: u32) -> Result<Vec<Message>> {
        self.client.get_json(&history_path(key, page), &[]).await
    }
}

impl std::fmt::Debug for ChatApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatApi")
            .field("group_base", &self.group_base)
            .finish()
    }
}

fn history_path(key: &ConversationKey, page: u32) -> String {
    format!("{}/{}", key.path(), page)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DirectSendRequest<'a> {
    receiver_id: UserId,
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupSendRequest<'a> {
    student_ids: Vec<UserId>,
    text: &'a str,
}

#[async_trait]
impl PageFetcher<ConversationKey, Message> for ChatApi {
    async fn fetch_page(&self, key: &ConversationKey, page: PageParam) -> Result<Vec<Message>> {
        self.history(key, page.index()).await
    }
}

#[async_trait]
impl MessageSender for ChatApi {
    async fn send_direct(&self, key: &ConversationKey, text: &str) -> Result<Message> {
        let body = DirectSendRequest {
            receiver_id: key.peer,
            text,
        };
        self.client.post_json(&key.base, &body).await
    }

    async fn send_group(&self, participants: &[UserId], text: &str) -> Result<Vec<Message>> {
        let body = GroupSendRequest {
            student_ids: participant_set(participants),
            text,
        };
        self.client.post_json(&self.group_base, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_history_path() {
        let key = ConversationKey::new("chat/student/", 42u64);
        assert_eq!(history_path(&key, 0), "chat/student/42/0");
        assert_eq!(history_path(&key, 3), "chat/student/42/3");
    }

    #[test]
    fn test_send_bodies() {
        let direct = DirectSendRequest {
            receiver_id: UserId(7),
            text: "hello",
        };
        assert_eq!(
            serde_json::to_value(&direct).unwrap(),
            json!({ "receiverId": 7, "text": "hello" })
        );

        let group = GroupSendRequest {
            student_ids: participant_set(&[UserId(3), UserId(1), UserId(3)]),
            text: "well done",
        };
        assert_eq!(
            serde_json::to_value(&group).unwrap(),
            json!({ "studentIds": [1, 3], "text": "well done" })
        );
    }

    #[test]
    fn test_history_page_decodes() {
        let page: Vec<Message> = serde_json::from_value(json!([
            {
                "id": 12,
                "sender": { "firstName": "Noa", "lastName": "Bar" },
                "text": "See you tomorrow",
                "timestamp": "2024-03-01T08:30:00Z",
                "isFromViewer": false
            },
            {
                "id": 11,
                "text": "Thanks!",
                "timestamp": "2024-03-01 08:00:00",
                "isFromViewer": true,
                "viewCount": 2
            }
        ]))
        .unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(page[0].sender_name.as_ref().unwrap().display(), "Noa Bar");
        assert!(page[1].is_from_viewer);
        assert_eq!(page[1].view_count, 2);
        assert!(page.iter().all(|m| m.delivery.is_confirmed()));
    }
}
