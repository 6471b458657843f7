//! Keyed cache of paginated fetches.
//!
//! Each key owns an ordered list of pages, page 0 being the most recent.
//! Fetches for one key are serialized, so page N+1 is never requested before
//! page N has resolved. Fetch failures never clear cached pages; they are
//! recorded and exposed through [`FeedCache::is_error`].

use async_trait::async_trait;
use serde::Serialize;
use std::{
    collections::{HashMap, HashSet},
    fmt,
    hash::Hash,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::error::{Error, Result};

/// One fetch's worth of items.
pub type Page<T> = Vec<T>;

/// Index of a page within its key, counted from the most recent page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PageParam(pub u32);

impl PageParam {
    pub fn index(self) -> u32 {
        self.0
    }

    pub fn next(self) -> Self {
        PageParam(self.0 + 1)
    }
}

/// Fetches one page for a key. The boundary every cached feed sits on.
#[async_trait]
pub trait PageFetcher<K, T>: Send + Sync {
    async fn fetch_page(&self, key: &K, page: PageParam) -> Result<Vec<T>>;
}

/// Cached pages for one key.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedCacheEntry<T> {
    pub pages: Vec<Page<T>>,
    pub page_params: Vec<PageParam>,
}

impl<T> Default for FeedCacheEntry<T> {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            page_params: Vec::new(),
        }
    }
}

impl<T: Clone> FeedCacheEntry<T> {
    /// All pages concatenated, newest first.
    pub fn flatten(&self) -> Vec<T> {
        self.pages.iter().flatten().cloned().collect()
    }
}

/// Something whose contents can be thrown away and refetched wholesale.
///
/// Lets a controller poke caches of unrelated item types after a write.
#[async_trait]
pub trait PeripheralCache: Send + Sync {
    async fn invalidate_all(&self);
}

struct SlotState<T> {
    entry: FeedCacheEntry<T>,
    loaded: bool,
    /// Page 0 has been requested at least once, whatever the outcome.
    attempted: bool,
    stale: bool,
    error: Option<String>,
    /// Length of the most recently appended page as fetched.
    last_fetched_len: usize,
    /// Bumped on invalidation; later-page results from an older generation are dropped.
    generation: u64,
    refetch_queued: bool,
    fetching: bool,
    observers: usize,
}

impl<T> SlotState<T> {
    fn needs_first_page(&self) -> bool {
        !self.loaded || self.stale
    }
}

impl<T> Default for SlotState<T> {
    fn default() -> Self {
        Self {
            entry: FeedCacheEntry::default(),
            loaded: false,
            attempted: false,
            stale: false,
            error: None,
            last_fetched_len: 0,
            generation: 0,
            refetch_queued: false,
            fetching: false,
            observers: 0,
        }
    }
}

struct Slot<T> {
    state: Mutex<SlotState<T>>,
    fetch_lock: tokio::sync::Mutex<()>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::default()),
            fetch_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SlotState<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Set a flag now and clear it when the guard drops, even if the
    /// owning future is cancelled first.
    fn raise(&self, flag: fn(&mut SlotState<T>) -> &mut bool) -> FlagGuard<'_, T> {
        *flag(&mut self.state()) = true;
        FlagGuard { slot: self, flag }
    }
}

struct FlagGuard<'a, T> {
    slot: &'a Slot<T>,
    flag: fn(&mut SlotState<T>) -> &mut bool,
}

impl<T> Drop for FlagGuard<'_, T> {
    fn drop(&mut self) {
        *(self.flag)(&mut self.slot.state()) = false;
    }
}

/// Keyed, paginated cache over an injected [`PageFetcher`].
pub struct FeedCache<K, T> {
    fetcher: Arc<dyn PageFetcher<K, T>>,
    limit: usize,
    retained: HashSet<K>,
    slots: Mutex<HashMap<K, Arc<Slot<T>>>>,
}

impl<K, T> fmt::Debug for FeedCache<K, T>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self
            .slots
            .lock()
            .map(|s| s.keys().map(|k| format!("{k:?}")).collect())
            .unwrap_or_default();
        f.debug_struct("FeedCache")
            .field("limit", &self.limit)
            .field("retained", &self.retained)
            .field("keys", &keys)
            .finish()
    }
}

impl<K, T> FeedCache<K, T>
where
    K: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Create a cache whose full pages hold `limit` items.
    pub fn new(fetcher: Arc<dyn PageFetcher<K, T>>, limit: usize) -> Self {
        Self {
            fetcher,
            limit,
            retained: HashSet::new(),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Keep `key` cached after its last observer goes away.
    pub fn retain_key(mut self, key: K) -> Self {
        self.retained.insert(key);
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<K, Arc<Slot<T>>>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn slot(&self, key: &K) -> Option<Arc<Slot<T>>> {
        self.slots().get(key).cloned()
    }

    fn slot_or_insert(&self, key: &K) -> Arc<Slot<T>> {
        self.slots()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Slot::new()))
            .clone()
    }

    fn loaded_slot(&self, key: &K) -> Result<Arc<Slot<T>>> {
        match self.slot(key) {
            Some(slot) if slot.state().loaded => Ok(slot),
            _ => Err(Error::NotLoaded(format!("{key:?}"))),
        }
    }

    /// Like `loaded_slot`, but also accepts a key whose first fetch failed.
    fn writable_slot(&self, key: &K) -> Result<Arc<Slot<T>>> {
        match self.slot(key) {
            Some(slot) if slot.state().attempted => Ok(slot),
            _ => Err(Error::NotLoaded(format!("{key:?}"))),
        }
    }

    /// Register an active view of `key`.
    ///
    /// Only observed keys are refetched on invalidation. When the last
    /// observer drops, the entry is discarded unless the key is retained.
    pub fn observe(self: &Arc<Self>, key: K) -> Observer<K, T> {
        let slot = self.slot_or_insert(&key);
        slot.state().observers += 1;
        Observer {
            cache: Arc::clone(self),
            key,
            slot,
        }
    }

    fn release(&self, key: &K, slot: &Arc<Slot<T>>) {
        let remaining = {
            let mut state = slot.state();
            state.observers = state.observers.saturating_sub(1);
            state.observers
        };

        if remaining > 0 || self.retained.contains(key) {
            return;
        }

        let mut slots = self.slots();
        if slots.get(key).is_some_and(|s| Arc::ptr_eq(s, slot)) {
            slots.remove(key);
            log::debug!("discarded feed cache entry {key:?}");
        }
    }

    /// Cached pages for `key`.
    ///
    /// Page 0 is fetched first if nothing is cached yet, or refetched if the
    /// key was invalidated while nobody was looking at it.
    pub async fn get_pages(&self, key: &K) -> Vec<Page<T>> {
        let slot = self.slot_or_insert(key);

        let needed = slot.state().needs_first_page();
        if needed {
            let _fetch = slot.fetch_lock.lock().await;
            // Another caller may have finished the fetch while we waited.
            let needed = slot.state().needs_first_page();
            if needed {
                self.fetch_first_page(key, &slot).await;
            }
        }

        let pages = slot.state().entry.pages.clone();
        pages
    }

    /// Append the next page for an already loaded key.
    ///
    /// A no-op once the last page came back short.
    pub async fn fetch_next_page(&self, key: &K) -> Result<()> {
        let slot = self.loaded_slot(key)?;
        let _fetch = slot.fetch_lock.lock().await;

        let (param, generation) = {
            let state = slot.state();
            if state.last_fetched_len < self.limit {
                return Ok(());
            }
            let param = state
                .entry
                .page_params
                .last()
                .map(|p| p.next())
                .unwrap_or_default();
            (param, state.generation)
        };

        let fetching = slot.raise(|s| &mut s.fetching);
        log::debug!("fetching page {} for {key:?}", param.index());
        let result = self.fetcher.fetch_page(key, param).await;
        drop(fetching);

        let mut state = slot.state();
        match result {
            Ok(_) if state.generation != generation => {
                log::debug!(
                    "dropping page {} for {key:?}: invalidated while in flight",
                    param.index()
                );
            }
            Ok(page) => {
                state.last_fetched_len = page.len();
                state.entry.pages.push(page);
                state.entry.page_params.push(param);
                state.error = None;
            }
            Err(e) => {
                log::warn!("page {} for {key:?} failed: {e}", param.index());
                state.error = Some(e.to_string());
            }
        }

        Ok(())
    }

    async fn fetch_first_page(&self, key: &K, slot: &Slot<T>) {
        let fetching = slot.raise(|s| &mut s.fetching);
        log::debug!("fetching page 0 for {key:?}");
        let result = self.fetcher.fetch_page(key, PageParam(0)).await;
        drop(fetching);

        let mut state = slot.state();
        state.attempted = true;
        match result {
            Ok(page) => {
                let fetched = page.len();
                if state.entry.pages.is_empty() {
                    state.entry.pages.push(page);
                    state.entry.page_params.push(PageParam(0));
                } else {
                    state.entry.pages[0] = page;
                    state.entry.page_params[0] = PageParam(0);
                }
                if state.entry.pages.len() == 1 {
                    state.last_fetched_len = fetched;
                }
                state.loaded = true;
                state.stale = false;
                state.error = None;
            }
            Err(e) => {
                log::warn!("page 0 for {key:?} failed: {e}");
                state.error = Some(e.to_string());
            }
        }
    }

    /// Insert `item` at the head of page 0. Page params are untouched.
    pub fn prepend_to_first_page(&self, key: &K, item: T) -> Result<()> {
        self.update_first_page(key, |page| page.insert(0, item))
    }

    /// Mutate page 0 in place.
    ///
    /// Allowed once page 0 has been requested, even if that request failed,
    /// so local writes still show up while the network is down.
    pub fn update_first_page<R>(&self, key: &K, f: impl FnOnce(&mut Page<T>) -> R) -> Result<R> {
        let slot = self.writable_slot(key)?;
        let mut state = slot.state();
        if state.entry.pages.is_empty() {
            state.entry.pages.push(Vec::new());
            state.entry.page_params.push(PageParam(0));
        }
        Ok(f(&mut state.entry.pages[0]))
    }

    /// Mark `key` stale and, if it is observed, refetch page 0.
    ///
    /// An unobserved key is refetched by the next [`get_pages`](Self::get_pages).
    /// Later pages are not refetched. Invalidations that arrive while a
    /// refetch is queued or in flight collapse into it.
    pub async fn invalidate(&self, key: &K) {
        let Some(slot) = self.slot(key) else {
            return;
        };

        {
            let mut state = slot.state();
            state.stale = true;
            state.generation += 1;
            if state.observers == 0 {
                return;
            }
            if state.refetch_queued {
                log::debug!("refetch of {key:?} already pending");
                return;
            }
            state.refetch_queued = true;
        }

        // Cleared on drop, so a cancelled wait does not block later refetches.
        let _queued = FlagGuard {
            slot: &slot,
            flag: |s| &mut s.refetch_queued,
        };
        let _fetch = slot.fetch_lock.lock().await;
        self.fetch_first_page(key, &slot).await;
    }

    /// Invalidate on a background task.
    pub fn invalidate_detached(self: &Arc<Self>, key: K) {
        let cache = Arc::clone(self);
        tokio::spawn(async move { cache.invalidate(&key).await });
    }

    /// Invalidate every cached key.
    pub async fn invalidate_all_keys(&self) {
        let keys: Vec<K> = self.slots().keys().cloned().collect();
        for key in keys {
            self.invalidate(&key).await;
        }
    }

    /// Drop a key outright.
    pub fn remove(&self, key: &K) {
        self.slots().remove(key);
    }

    /// Snapshot of the cached pages and their params.
    pub fn entry(&self, key: &K) -> Option<FeedCacheEntry<T>> {
        self.slot(key).map(|slot| slot.state().entry.clone())
    }

    /// Cached pages without triggering a fetch.
    pub fn pages(&self, key: &K) -> Vec<Page<T>> {
        self.entry(key).map(|e| e.pages).unwrap_or_default()
    }

    /// All cached items for `key`, newest first.
    pub fn flattened(&self, key: &K) -> Vec<T> {
        self.entry(key).map(|e| e.flatten()).unwrap_or_default()
    }

    /// Whether another page may exist: the last fetched page was full.
    pub fn has_next_page(&self, key: &K) -> bool {
        self.slot(key).is_some_and(|slot| {
            let state = slot.state();
            state.loaded && state.last_fetched_len >= self.limit
        })
    }

    pub fn is_loaded(&self, key: &K) -> bool {
        self.slot(key).is_some_and(|slot| slot.state().loaded)
    }

    pub fn is_stale(&self, key: &K) -> bool {
        self.slot(key).is_some_and(|slot| slot.state().stale)
    }

    pub fn is_fetching(&self, key: &K) -> bool {
        self.slot(key).is_some_and(|slot| slot.state().fetching)
    }

    pub fn is_error(&self, key: &K) -> bool {
        self.error(key).is_some()
    }

    /// Message of the most recent failed fetch, cleared by the next success.
    pub fn error(&self, key: &K) -> Option<String> {
        self.slot(key).and_then(|slot| slot.state().error.clone())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.slots().contains_key(key)
    }
}

#[async_trait]
impl<K, T> PeripheralCache for FeedCache<K, T>
where
    K: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    async fn invalidate_all(&self) {
        self.invalidate_all_keys().await;
    }
}

/// RAII registration of an active view; see [`FeedCache::observe`].
pub struct Observer<K, T>
where
    K: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    cache: Arc<FeedCache<K, T>>,
    key: K,
    slot: Arc<Slot<T>>,
}

impl<K, T> Observer<K, T>
where
    K: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K, T> fmt::Debug for Observer<K, T>
where
    K: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer").field("key", &self.key).finish()
    }
}

impl<K, T> Drop for Observer<K, T>
where
    K: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.cache.release(&self.key, &self.slot);
    }
}
