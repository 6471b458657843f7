//! Session-scoped history for ad hoc group sends.
//!
//! A group conversation has no server-side history, so whatever was sent in
//! this session lives here and nowhere else. The buffer is only valid for the
//! exact participant set that produced it.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::models::{participant_set, Message, UserId};
use crate::store::{SessionStore, SessionStoreExt};

/// Persisted form of the buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftEntry {
    pub messages: Vec<Message>,
    pub participant_ids: Vec<UserId>,
}

impl DraftEntry {
    fn matches(&self, participants: &[UserId]) -> bool {
        participant_set(&self.participant_ids) == participant_set(participants)
    }
}

/// Group-send staging area backed by a [`SessionStore`].
#[derive(Debug, Clone)]
pub struct DraftSessionBuffer {
    store: Arc<dyn SessionStore>,
    key: String,
}

impl DraftSessionBuffer {
    /// Create a buffer persisted under `key`.
    pub fn new(store: Arc<dyn SessionStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    fn read(&self) -> Option<DraftEntry> {
        self.store.get_json(&self.key)
    }

    fn write(&self, entry: &DraftEntry) -> Result<()> {
        self.store.set_json(&self.key, entry)
    }

    /// Messages sent to exactly this participant set, compared order-free.
    ///
    /// A buffer for any other set is stale: it is cleared and `None` returned.
    pub fn load(&self, participants: &[UserId]) -> Option<Vec<Message>> {
        let entry = self.read()?;

        if entry.matches(participants) {
            return Some(entry.messages);
        }

        log::debug!(
            "discarding group draft for {:?}, now showing {:?}",
            entry.participant_ids,
            participants
        );
        if let Err(e) = self.clear() {
            log::warn!("failed to clear stale group draft: {e}");
        }
        None
    }

    /// Add a message for `participants`.
    ///
    /// Appends to a buffer for the same set; replaces a buffer for any other.
    pub fn append(&self, message: Message, participants: &[UserId]) -> Result<()> {
        let entry = match self.read() {
            Some(mut entry) if entry.matches(participants) => {
                entry.messages.push(message);
                entry
            }
            _ => DraftEntry {
                messages: vec![message],
                participant_ids: participants.to_vec(),
            },
        };

        self.write(&entry)
    }

    /// Edit the buffered messages in place, if a buffer for `participants` exists.
    pub fn update<R>(
        &self,
        participants: &[UserId],
        f: impl FnOnce(&mut Vec<Message>) -> R,
    ) -> Result<Option<R>> {
        let Some(mut entry) = self.read().filter(|e| e.matches(participants)) else {
            return Ok(None);
        };

        let result = f(&mut entry.messages);
        self.write(&entry)?;
        Ok(Some(result))
    }

    /// Drop the buffer, e.g. when leaving the group-compose flow.
    pub fn clear(&self) -> Result<()> {
        self.store.remove(&self.key)
    }
}
