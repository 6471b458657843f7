//! Chat message models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{timestamp, MessageId};
use crate::feed::Dated;

/// First/last name pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    pub first_name: String,
    pub last_name: String,
}

impl PersonName {
    /// Create a name pair.
    pub fn new(first: impl Into<String>, last: impl Into<String>) -> Self {
        Self {
            first_name: first.into(),
            last_name: last.into(),
        }
    }

    /// Full name for display.
    pub fn display(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            (true, false) => self.last_name.clone(),
            (true, true) => String::new(),
        }
    }
}

/// Where a message stands relative to the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    /// Committed server-side.
    #[default]
    Confirmed,
    /// Rendered locally, send in flight.
    Pending,
    /// Send failed; the entry stays visible without an id.
    Failed,
}

impl Delivery {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Delivery::Confirmed)
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server id; `None` until an optimistic entry is reconciled.
    #[serde(default)]
    pub id: Option<MessageId>,
    /// Sender name, omitted when the viewer sent it.
    #[serde(default, rename = "sender", skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<PersonName>,
    /// Message body.
    pub text: String,
    /// Ordering key.
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Whether the viewer sent this message.
    #[serde(default)]
    pub is_from_viewer: bool,
    /// Times the recipient opened it; only meaningful for the viewer's own messages.
    #[serde(default)]
    pub view_count: u32,
    #[serde(default, skip_serializing_if = "Delivery::is_confirmed")]
    pub delivery: Delivery,
    /// Client-side identity of an optimistic entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_token: Option<u64>,
}

impl Message {
    /// Build an optimistic entry for a message the viewer is sending now.
    pub fn optimistic(text: impl Into<String>, token: u64, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            sender_name: None,
            text: text.into(),
            timestamp: now,
            is_from_viewer: true,
            view_count: 0,
            delivery: Delivery::Pending,
            local_token: Some(token),
        }
    }

    /// Fold a server-committed copy into this optimistic entry.
    ///
    /// The local token survives so the entry keeps its identity for
    /// scroll anchoring.
    pub fn reconcile(&mut self, committed: Message) {
        let token = self.local_token;
        *self = committed;
        self.delivery = Delivery::Confirmed;
        self.local_token = token;
    }

    /// Mark an optimistic entry as failed.
    pub fn mark_failed(&mut self) {
        self.delivery = Delivery::Failed;
    }

    pub fn is_optimistic(&self) -> bool {
        self.local_token.is_some() && self.id.is_none()
    }
}

impl Dated for Message {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_server_message() {
        let json = r#"{
            "id": 17,
            "sender": { "firstName": "Dana", "lastName": "Levi" },
            "text": "Great work today",
            "timestamp": "2024-03-01T08:15:00",
            "isFromViewer": false,
            "viewCount": 0
        }"#;

        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, Some(MessageId(17)));
        assert_eq!(msg.sender_name.as_ref().unwrap().display(), "Dana Levi");
        assert_eq!(
            msg.timestamp,
            chrono::Local
                .with_ymd_and_hms(2024, 3, 1, 8, 15, 0)
                .earliest()
                .unwrap()
                .with_timezone(&Utc)
        );
        assert_eq!(msg.delivery, Delivery::Confirmed);
        assert_eq!(msg.local_token, None);
    }

    #[test]
    fn test_reconcile_keeps_token() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let mut msg = Message::optimistic("hello", 3, now);
        assert!(msg.is_optimistic());

        let committed = Message {
            id: Some(MessageId(99)),
            timestamp: now + chrono::Duration::seconds(2),
            delivery: Delivery::Confirmed,
            local_token: None,
            ..msg.clone()
        };
        msg.reconcile(committed);

        assert_eq!(msg.id, Some(MessageId(99)));
        assert_eq!(msg.local_token, Some(3));
        assert_eq!(msg.delivery, Delivery::Confirmed);
        assert!(!msg.is_optimistic());
    }

    #[test]
    fn test_optimistic_round_trips_through_session_json() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let mut msg = Message::optimistic("hello", 5, now);
        msg.mark_failed();

        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_person_name_display() {
        assert_eq!(PersonName::new("Noa", "").display(), "Noa");
        assert_eq!(PersonName::default().display(), "");
    }
}
