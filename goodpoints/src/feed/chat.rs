//! One conversation's merged, date-grouped view and its send path.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
};
use tokio::time::Instant;

use super::{
    cache::{FeedCache, Observer, PeripheralCache},
    config::{FeedConfig, StickyConfig},
    draft::DraftSessionBuffer,
    grouper::{group_by_day, DateBlock},
    sticky::{StickyDateController, StickyDateState},
};
use crate::error::{Error, Result};
use crate::models::{participant_set, Delivery, Message, MessageId, UserId};

/// Cache identity of a 1:1 history: the REST base plus the other party's id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ConversationKey {
    /// Collection path, e.g. `chat/student`.
    pub base: String,
    pub peer: UserId,
}

impl ConversationKey {
    pub fn new(base: impl Into<String>, peer: impl Into<UserId>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_owned(),
            peer: peer.into(),
        }
    }

    /// `<base>/<peer>`, the history path without a page index.
    pub fn path(&self) -> String {
        format!("{}/{}", self.base, self.peer)
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Which conversation a [`ChatFeedController`] shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversation {
    /// Server-backed 1:1 history.
    Direct(ConversationKey),
    /// Ad hoc group send; history lives only in the session draft.
    Group(Vec<UserId>),
}

/// Write side of the messaging boundary.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Commit a 1:1 message; returns the stored message.
    async fn send_direct(&self, key: &ConversationKey, text: &str) -> Result<Message>;

    /// Commit a group message; the first element is the viewer's copy.
    async fn send_group(&self, participants: &[UserId], text: &str) -> Result<Vec<Message>>;
}

/// Result of [`ChatFeedController::send`].
#[derive(Debug)]
pub enum SendOutcome {
    /// Blank text; nothing happened.
    Skipped,
    /// Committed; carries the reconciled entry.
    Sent(Message),
    /// The optimistic entry stays in place, marked failed.
    Failed(Error),
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent(_))
    }
}

/// Identity of the newest message as seen by the scroll trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MessageRef {
    Server(MessageId),
    Local(u64),
}

/// Changes exactly once per new newest message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScrollAnchor {
    pub generation: u64,
    pub newest: Option<MessageRef>,
}

#[derive(Debug, Default)]
struct AnchorTracker {
    anchor: ScrollAnchor,
    last_id: Option<MessageId>,
    last_token: Option<u64>,
}

impl AnchorTracker {
    fn observe(&mut self, newest: Option<&Message>) -> ScrollAnchor {
        let Some(message) = newest else {
            return self.anchor;
        };

        // An optimistic entry, its reconciled copy and a refetched copy are one message.
        let same_id = message.id.is_some() && message.id == self.last_id;
        let same_token = message.local_token.is_some() && message.local_token == self.last_token;

        if same_id || same_token {
            self.last_id = message.id.or(self.last_id);
            self.last_token = message.local_token.or(self.last_token);
            return self.anchor;
        }

        self.last_id = message.id;
        self.last_token = message.local_token;
        self.anchor = ScrollAnchor {
            generation: self.anchor.generation + 1,
            newest: match (message.local_token, message.id) {
                (Some(token), _) => Some(MessageRef::Local(token)),
                (None, Some(id)) => Some(MessageRef::Server(id)),
                (None, None) => None,
            },
        };
        self.anchor
    }
}

/// Render-ready snapshot of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatView {
    /// Newest block first; newest message first within each block.
    pub blocks: Vec<DateBlock<Message>>,
    pub has_more: bool,
    pub is_loaded: bool,
    pub is_error: bool,
    pub error: Option<String>,
}

impl ChatView {
    fn empty() -> Self {
        Self {
            blocks: Vec::new(),
            has_more: false,
            is_loaded: false,
            is_error: false,
            error: None,
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.iter().map(DateBlock::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct ChatState {
    conversation: Option<Conversation>,
    observer: Option<Observer<ConversationKey, Message>>,
    sticky: StickyDateController,
    anchor: AnchorTracker,
    mounted: bool,
}

/// Presents one conversation and performs optimistic sends.
pub struct ChatFeedController {
    cache: Arc<FeedCache<ConversationKey, Message>>,
    drafts: DraftSessionBuffer,
    sender: Arc<dyn MessageSender>,
    peripherals: Vec<Arc<dyn PeripheralCache>>,
    sticky: StickyConfig,
    state: Mutex<ChatState>,
    next_token: AtomicU64,
}

impl fmt::Debug for ChatFeedController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("ChatFeedController")
            .field("conversation", &state.conversation)
            .field("mounted", &state.mounted)
            .field("peripherals", &self.peripherals.len())
            .finish()
    }
}

impl ChatFeedController {
    pub fn new(
        cache: Arc<FeedCache<ConversationKey, Message>>,
        drafts: DraftSessionBuffer,
        sender: Arc<dyn MessageSender>,
        config: &FeedConfig,
    ) -> Self {
        Self {
            cache,
            drafts,
            sender,
            peripherals: Vec::new(),
            sticky: config.sticky.clone(),
            state: Mutex::new(ChatState {
                conversation: None,
                observer: None,
                sticky: StickyDateController::new(config.sticky.clone(), Instant::now()),
                anchor: AnchorTracker::default(),
                mounted: false,
            }),
            next_token: AtomicU64::new(1),
        }
    }

    /// Invalidate `cache` after every successful send.
    pub fn with_peripheral(mut self, cache: Arc<dyn PeripheralCache>) -> Self {
        self.peripherals.push(cache);
        self
    }

    fn state(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn conversation(&self) -> Option<Conversation> {
        self.state().conversation.clone()
    }

    /// Show `conversation`. Call again whenever the logical key changes.
    pub async fn load(&self, conversation: Conversation) -> ChatView {
        let direct_key = match &conversation {
            Conversation::Direct(key) => Some(key.clone()),
            Conversation::Group(_) => None,
        };

        {
            let mut state = self.state();
            let changed = state.conversation.as_ref() != Some(&conversation);
            if changed || !state.mounted {
                state.observer = direct_key.clone().map(|key| self.cache.observe(key));
            }
            if !state.mounted {
                state.sticky = StickyDateController::new(self.sticky.clone(), Instant::now());
            } else if changed {
                state.sticky.dependencies_changed(Instant::now());
            }
            state.conversation = Some(conversation);
            state.mounted = true;
        }

        if let Some(key) = direct_key {
            self.cache.get_pages(&key).await;
        }

        self.view()
    }

    /// Fetch the next older page of a 1:1 history.
    pub async fn load_older(&self) {
        let key = {
            let state = self.state();
            match (&state.conversation, state.mounted) {
                (Some(Conversation::Direct(key)), true) => key.clone(),
                _ => return,
            }
        };

        if let Err(e) = self.cache.fetch_next_page(&key).await {
            log::warn!("cannot page {key}: {e}");
        }
    }

    /// Merged messages, newest first.
    pub fn messages(&self) -> Vec<Message> {
        let conversation = self.state().conversation.clone();
        match conversation {
            Some(Conversation::Direct(key)) => self.cache.flattened(&key),
            Some(Conversation::Group(participants)) => self.group_messages(&participants),
            None => Vec::new(),
        }
    }

    fn group_messages(&self, participants: &[UserId]) -> Vec<Message> {
        if participants.is_empty() {
            return Vec::new();
        }
        let mut messages = self.drafts.load(participants).unwrap_or_default();
        // The draft is kept in send order.
        messages.reverse();
        messages
    }

    /// Date-grouped snapshot for rendering.
    pub fn view(&self) -> ChatView {
        let conversation = self.state().conversation.clone();
        let Some(conversation) = conversation else {
            return ChatView::empty();
        };

        let blocks = group_by_day(&self.messages());
        match conversation {
            Conversation::Direct(key) => {
                let error = self.cache.error(&key);
                ChatView {
                    blocks,
                    has_more: self.cache.has_next_page(&key),
                    is_loaded: self.cache.is_loaded(&key),
                    is_error: error.is_some(),
                    error,
                }
            }
            Conversation::Group(_) => ChatView {
                blocks,
                has_more: false,
                is_loaded: true,
                is_error: false,
                error: None,
            },
        }
    }

    /// Current scroll trigger; see [`ScrollAnchor`].
    pub fn scroll_anchor(&self) -> ScrollAnchor {
        let messages = self.messages();
        self.state().anchor.observe(messages.first())
    }

    /// Send `text`, showing it before the server answers.
    ///
    /// Network failures never surface as `Err`; they come back as
    /// [`SendOutcome::Failed`] with the entry left in place, including when
    /// the history itself failed to load. `Err` means the controller was used
    /// out of order, e.g. sending before `load`.
    pub async fn send(&self, text: &str) -> Result<SendOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SendOutcome::Skipped);
        }

        let conversation = self
            .conversation()
            .ok_or_else(|| Error::NotLoaded("no conversation".into()))?;
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let optimistic = Message::optimistic(text, token, Utc::now());

        let outcome = match conversation {
            Conversation::Direct(key) => {
                self.cache.prepend_to_first_page(&key, optimistic)?;
                let result = self.sender.send_direct(&key, text).await;
                self.settle_direct(&key, token, result)
            }
            Conversation::Group(participants) => {
                if participants.is_empty() {
                    return Err(Error::InvalidArgument("group has no participants".into()));
                }
                self.drafts.append(optimistic, &participants)?;
                let result = self.sender.send_group(&participants, text).await;
                self.settle_group(&participants, token, result)?
            }
        };

        if outcome.is_sent() {
            for cache in &self.peripherals {
                let cache = Arc::clone(cache);
                tokio::spawn(async move { cache.invalidate_all().await });
            }
        }

        Ok(outcome)
    }

    fn settle_direct(
        &self,
        key: &ConversationKey,
        token: u64,
        result: Result<Message>,
    ) -> SendOutcome {
        let settled = self.cache.update_first_page(key, |page| {
            let entry = page.iter_mut().find(|m| m.local_token == Some(token))?;
            match &result {
                Ok(committed) => entry.reconcile(committed.clone()),
                Err(_) => entry.mark_failed(),
            }
            Some(entry.clone())
        });

        match result {
            Ok(committed) => {
                let message = settled.ok().flatten().unwrap_or(committed);
                SendOutcome::Sent(message)
            }
            Err(e) => {
                log::warn!("send to {key} failed: {e}");
                SendOutcome::Failed(e)
            }
        }
    }

    fn settle_group(
        &self,
        participants: &[UserId],
        token: u64,
        result: Result<Vec<Message>>,
    ) -> Result<SendOutcome> {
        let settled = self.drafts.update(participants, |messages| {
            let entry = messages.iter_mut().find(|m| m.local_token == Some(token))?;
            match &result {
                Ok(committed) => match committed.first() {
                    Some(first) => entry.reconcile(first.clone()),
                    None => entry.delivery = Delivery::Confirmed,
                },
                Err(_) => entry.mark_failed(),
            }
            Some(entry.clone())
        })?;

        Ok(match result {
            Ok(committed) => match settled.flatten().or_else(|| committed.into_iter().next()) {
                Some(message) => SendOutcome::Sent(message),
                None => SendOutcome::Failed(Error::EmptyResponse),
            },
            Err(e) => {
                log::warn!("group send to {:?} failed: {e}", participant_set(participants));
                SendOutcome::Failed(e)
            }
        })
    }

    /// A push signal says `key` has a new inbound message.
    ///
    /// Invalidates `key` whether or not it is the conversation on screen; the
    /// cache refetches it now if someone is viewing it, otherwise on next load.
    pub async fn on_external_message_signal(&self, key: &ConversationKey) {
        self.cache.invalidate(key).await;
    }

    /// Leave the group-compose flow, dropping its draft.
    pub fn leave_group(&self) -> Result<()> {
        self.drafts.clear()
    }

    /// Feed a scroll event to the sticky date label.
    pub fn on_scroll(&self, now: Instant) -> Option<StickyDateState> {
        self.state().sticky.on_scroll(now)
    }

    /// Fire the sticky label's idle timer if due.
    pub fn poll_sticky(&self, now: Instant) -> Option<StickyDateState> {
        self.state().sticky.poll(now)
    }

    pub fn sticky_state(&self) -> StickyDateState {
        self.state().sticky.state()
    }

    /// Stop paging, release the cache entry and silence the sticky label.
    ///
    /// Fetches already in flight may still land; they only touch the cache.
    pub fn unmount(&self) {
        let mut state = self.state();
        state.mounted = false;
        state.observer = None;
        state.sticky.teardown();
    }

    pub fn is_mounted(&self) -> bool {
        self.state().mounted
    }
}
