//! Read-only dated feeds: student activity, teacher activity, received good points.

use async_trait::async_trait;
use serde::Serialize;
use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};
use tokio::time::Instant;

use super::{
    cache::{FeedCache, Observer},
    config::StickyConfig,
    grouper::{group_by_day, DateBlock},
    sticky::{StickyDateController, StickyDateState},
};
use crate::error::Result;
use crate::models::{FeedItem, ListType, UserId};

/// Cache identity of an activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ActivityKey {
    pub list_type: ListType,
    /// Whose activity, when the viewer looks at someone else's feed.
    pub subject: Option<UserId>,
}

impl ActivityKey {
    pub fn new(list_type: ListType, subject: Option<UserId>) -> Self {
        Self { list_type, subject }
    }

    /// REST path of the feed.
    pub fn path(&self) -> String {
        match self.subject {
            Some(id) => format!("{}/{}", self.list_type.path(), id),
            None => self.list_type.path().to_owned(),
        }
    }
}

/// Clears the viewer's unread good-point counter.
#[async_trait]
pub trait UnreadCounter: Send + Sync {
    async fn reset_unread_count(&self) -> Result<()>;
}

/// Render-ready snapshot of a feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityView {
    pub list_type: Option<ListType>,
    pub blocks: Vec<DateBlock<FeedItem>>,
    pub has_more: bool,
    pub is_loaded: bool,
    pub is_error: bool,
    pub error: Option<String>,
}

impl ActivityView {
    pub fn len(&self) -> usize {
        self.blocks.iter().map(DateBlock::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct ActivityState {
    key: Option<ActivityKey>,
    observer: Option<Observer<ActivityKey, FeedItem>>,
    sticky: StickyDateController,
    mounted: bool,
    marked_read: bool,
}

/// Forward-paginated, date-grouped feed with no local writes.
pub struct ActivityFeedController {
    cache: Arc<FeedCache<ActivityKey, FeedItem>>,
    unread: Arc<dyn UnreadCounter>,
    sticky: StickyConfig,
    state: Mutex<ActivityState>,
}

impl fmt::Debug for ActivityFeedController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("ActivityFeedController")
            .field("key", &state.key)
            .field("mounted", &state.mounted)
            .finish()
    }
}

impl ActivityFeedController {
    pub fn new(
        cache: Arc<FeedCache<ActivityKey, FeedItem>>,
        unread: Arc<dyn UnreadCounter>,
        sticky: StickyConfig,
    ) -> Self {
        let state = ActivityState {
            key: None,
            observer: None,
            sticky: StickyDateController::new(sticky.clone(), Instant::now()),
            mounted: false,
            marked_read: false,
        };
        Self {
            cache,
            unread,
            sticky,
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, ActivityState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn current_key(&self) -> Option<ActivityKey> {
        let state = self.state();
        state.key.clone().filter(|_| state.mounted)
    }

    /// Show the `list_type` feed, optionally for another user.
    ///
    /// Opening the received-good-points feed resets the unread counter once
    /// per mount.
    pub async fn load(&self, subject: Option<UserId>, list_type: ListType) -> ActivityView {
        let key = ActivityKey::new(list_type, subject);

        let mark_read = {
            let mut state = self.state();
            let changed = state.key.as_ref() != Some(&key);
            if changed || !state.mounted {
                state.observer = Some(self.cache.observe(key.clone()));
            }
            if !state.mounted {
                state.sticky = StickyDateController::new(self.sticky.clone(), Instant::now());
                state.marked_read = false;
            } else if changed {
                state.sticky.dependencies_changed(Instant::now());
            }
            state.key = Some(key.clone());
            state.mounted = true;

            let mark = list_type.marks_read() && !state.marked_read;
            if mark {
                state.marked_read = true;
            }
            mark
        };

        if mark_read {
            if let Err(e) = self.unread.reset_unread_count().await {
                log::warn!("failed to reset unread count: {e}");
            }
        }

        self.cache.get_pages(&key).await;
        self.view()
    }

    /// Whether another page may exist.
    pub fn has_more(&self) -> bool {
        self.current_key()
            .is_some_and(|key| self.cache.has_next_page(&key))
    }

    /// Fetch the next page; ignored once unmounted.
    pub async fn fetch_next(&self) {
        let Some(key) = self.current_key() else {
            return;
        };
        if let Err(e) = self.cache.fetch_next_page(&key).await {
            log::warn!("cannot page {}: {e}", key.path());
        }
    }

    pub fn is_error(&self) -> bool {
        self.current_key().is_some_and(|key| self.cache.is_error(&key))
    }

    pub fn is_loaded(&self) -> bool {
        self.current_key().is_some_and(|key| self.cache.is_loaded(&key))
    }

    /// Items in server order, newest first.
    pub fn items(&self) -> Vec<FeedItem> {
        self.current_key()
            .map(|key| self.cache.flattened(&key))
            .unwrap_or_default()
    }

    pub fn blocks(&self) -> Vec<DateBlock<FeedItem>> {
        group_by_day(&self.items())
    }

    pub fn view(&self) -> ActivityView {
        let key = self.current_key();
        let error = key.as_ref().and_then(|k| self.cache.error(k));
        ActivityView {
            list_type: key.as_ref().map(|k| k.list_type),
            blocks: self.blocks(),
            has_more: self.has_more(),
            is_loaded: self.is_loaded(),
            is_error: error.is_some(),
            error,
        }
    }

    pub fn on_scroll(&self, now: Instant) -> Option<StickyDateState> {
        self.state().sticky.on_scroll(now)
    }

    pub fn poll_sticky(&self, now: Instant) -> Option<StickyDateState> {
        self.state().sticky.poll(now)
    }

    pub fn sticky_state(&self) -> StickyDateState {
        self.state().sticky.state()
    }

    /// Stop paging and release the cache entry.
    pub fn unmount(&self) {
        let mut state = self.state();
        state.mounted = false;
        state.observer = None;
        state.sticky.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::cache::{PageFetcher, PageParam, PeripheralCache};
    use crate::models::{MessageId, ReceivedGoodPoint, StudentActivity};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves `total` items per feed, newest first, `limit` per page.
    struct Feeds {
        total: u64,
        limit: u64,
        fail: bool,
        calls: Mutex<Vec<(ActivityKey, PageParam)>>,
    }

    impl Feeds {
        fn new(total: u64, limit: u64) -> Self {
            Self {
                total,
                limit,
                fail: false,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    fn item(list_type: ListType, n: u64) -> FeedItem {
        let timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
            - chrono::Duration::days(n as i64);
        match list_type {
            ListType::ReceivedGoodPoints => FeedItem::ReceivedGoodPoints(ReceivedGoodPoint {
                id: MessageId(n),
                text: format!("point {n}"),
                sender_name: "Dana Levi".into(),
                timestamp,
                reaction_count: 0,
            }),
            _ => FeedItem::StudentActivity(StudentActivity {
                id: MessageId(n),
                text: format!("point {n}"),
                student_name: "Yael Cohen".into(),
                teacher_name: None,
                timestamp,
            }),
        }
    }

    #[async_trait]
    impl PageFetcher<ActivityKey, FeedItem> for Feeds {
        async fn fetch_page(&self, key: &ActivityKey, page: PageParam) -> Result<Vec<FeedItem>> {
            self.calls.lock().unwrap().push((key.clone(), page));
            if self.fail {
                return Err(crate::error::Error::api(502, "bad gateway"));
            }
            let start = page.index() as u64 * self.limit;
            let end = (start + self.limit).min(self.total);
            Ok((start..end).map(|n| item(key.list_type, n)).collect())
        }
    }

    #[derive(Default)]
    struct Unread(AtomicUsize);

    #[async_trait]
    impl UnreadCounter for Unread {
        async fn reset_unread_count(&self) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn controller(feeds: Feeds, unread: Arc<Unread>) -> (Arc<Feeds>, ActivityFeedController) {
        let limit = feeds.limit as usize;
        let feeds = Arc::new(feeds);
        let cache = Arc::new(FeedCache::new(
            feeds.clone() as Arc<dyn PageFetcher<ActivityKey, FeedItem>>,
            limit,
        ));
        let controller = ActivityFeedController::new(cache, unread, StickyConfig::default());
        (feeds, controller)
    }

    #[test]
    fn test_activity_key_path() {
        let own = ActivityKey::new(ListType::ReceivedGoodPoints, None);
        assert_eq!(own.path(), "feed/received-good-points");

        let other = ActivityKey::new(ListType::TeacherActivity, Some(UserId(9)));
        assert_eq!(other.path(), "feed/teacher-activity/9");
    }

    #[tokio::test]
    async fn test_paginates_to_the_end() {
        let (feeds, feed) = controller(Feeds::new(7, 3), Arc::new(Unread::default()));

        let view = feed.load(None, ListType::StudentActivity).await;
        assert!(view.is_loaded);
        assert_eq!(view.len(), 3);
        assert_eq!(view.list_type, Some(ListType::StudentActivity));

        while feed.has_more() {
            feed.fetch_next().await;
        }

        let ids: Vec<u64> = feed.items().iter().map(|i| i.id().get()).collect();
        assert_eq!(ids, (0..7).collect::<Vec<_>>());
        assert_eq!(feeds.calls.lock().unwrap().len(), 3);
        // One item per day, so one block per item.
        assert_eq!(feed.blocks().len(), 7);
    }

    #[tokio::test]
    async fn test_received_feed_marks_read_once_per_mount() {
        let unread = Arc::new(Unread::default());
        let (_, feed) = controller(Feeds::new(2, 30), unread.clone());

        feed.load(None, ListType::ReceivedGoodPoints).await;
        feed.load(None, ListType::StudentActivity).await;
        feed.load(None, ListType::ReceivedGoodPoints).await;
        assert_eq!(unread.0.load(Ordering::SeqCst), 1);

        feed.unmount();
        feed.load(None, ListType::ReceivedGoodPoints).await;
        assert_eq!(unread.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_other_feeds_do_not_mark_read() {
        let unread = Arc::new(Unread::default());
        let (_, feed) = controller(Feeds::new(2, 30), unread.clone());

        feed.load(None, ListType::TeacherActivity).await;
        feed.load(Some(UserId(3)), ListType::StudentActivity).await;
        assert_eq!(unread.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_a_flag() {
        let mut feeds = Feeds::new(5, 3);
        feeds.fail = true;
        let (_, feed) = controller(feeds, Arc::new(Unread::default()));

        let view = feed.load(None, ListType::StudentActivity).await;
        assert!(view.is_error);
        assert!(!view.is_loaded);
        assert!(view.is_empty());
        assert!(view.error.unwrap().contains("bad gateway"));
    }

    #[tokio::test]
    async fn test_retained_feed_refetched_after_background_invalidation() {
        let feeds = Arc::new(Feeds::new(2, 30));
        let received = ActivityKey::new(ListType::ReceivedGoodPoints, None);
        let cache = Arc::new(
            FeedCache::new(feeds.clone() as Arc<dyn PageFetcher<ActivityKey, FeedItem>>, 30)
                .retain_key(received.clone()),
        );
        let feed = ActivityFeedController::new(
            cache.clone(),
            Arc::new(Unread::default()),
            StickyConfig::default(),
        );

        feed.load(None, ListType::ReceivedGoodPoints).await;
        feed.unmount();

        // E.g. a chat send elsewhere pokes this cache.
        let peripheral: Arc<dyn PeripheralCache> = cache.clone();
        peripheral.invalidate_all().await;
        assert_eq!(feeds.calls.lock().unwrap().len(), 1);

        let view = feed.load(None, ListType::ReceivedGoodPoints).await;
        assert_eq!(feeds.calls.lock().unwrap().len(), 2);
        assert_eq!(view.len(), 2);
        assert!(!cache.is_stale(&received));
    }

    #[tokio::test]
    async fn test_unmounted_feed_stops_paging() {
        let (feeds, feed) = controller(Feeds::new(10, 3), Arc::new(Unread::default()));
        feed.load(None, ListType::StudentActivity).await;

        feed.unmount();
        feed.fetch_next().await;

        assert_eq!(feeds.calls.lock().unwrap().len(), 1);
        assert!(!feed.has_more());
        assert!(feed.items().is_empty());
    }

    #[tokio::test]
    async fn test_switching_list_type_resets_sticky_label() {
        let (_, feed) = controller(Feeds::new(2, 30), Arc::new(Unread::default()));
        feed.load(None, ListType::StudentActivity).await;

        let t0 = Instant::now();
        assert!(feed.poll_sticky(t0 + std::time::Duration::from_millis(1500)).is_some());
        assert!(!feed.sticky_state().visible);

        feed.load(None, ListType::TeacherActivity).await;
        assert!(feed.sticky_state().visible);
        assert!(feed.on_scroll(Instant::now()).is_none());
    }
}
