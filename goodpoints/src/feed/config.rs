//! Feed engine configuration.

use std::time::Duration;

/// Default page size for history and activity fetches.
pub const DEFAULT_FETCH_LIMIT: usize = 30;

/// Session storage key for the group-send draft.
pub const DEFAULT_DRAFT_KEY: &str = "groupMessagesDraft";

/// Which layout the sticky date label is rendered in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Layout {
    #[default]
    Desktop,
    Mobile,
}

/// Timing and geometry for the sticky date label.
#[derive(Debug, Clone)]
pub struct StickyConfig {
    /// Quiet period after the last scroll before the label hides.
    pub idle: Duration,
    /// Length of the hide animation.
    pub hide_duration: Duration,
    /// Top offset, in percent of the label height, once hidden on desktop.
    pub hidden_offset_desktop: f32,
    /// Same, for the mobile layout.
    pub hidden_offset_mobile: f32,
    pub layout: Layout,
}

impl Default for StickyConfig {
    fn default() -> Self {
        Self {
            idle: Duration::from_millis(1500),
            hide_duration: Duration::from_millis(700),
            hidden_offset_desktop: -100.0,
            hidden_offset_mobile: -150.0,
            layout: Layout::default(),
        }
    }
}

impl StickyConfig {
    /// Hidden offset for the configured layout.
    pub fn hidden_offset(&self) -> f32 {
        match self.layout {
            Layout::Desktop => self.hidden_offset_desktop,
            Layout::Mobile => self.hidden_offset_mobile,
        }
    }
}

/// Configuration shared by the feed controllers.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Max page size; a shorter page ends pagination.
    ///
    /// Also sent as `perPage` on activity feed requests.
    pub fetch_limit: usize,
    pub sticky: StickyConfig,
    pub draft_storage_key: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            fetch_limit: DEFAULT_FETCH_LIMIT,
            sticky: StickyConfig::default(),
            draft_storage_key: DEFAULT_DRAFT_KEY.to_owned(),
        }
    }
}
