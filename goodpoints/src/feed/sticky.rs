//! Scroll-driven visibility of the floating date label.
//!
//! [`StickyDateController`] is the bare state machine: it is fed explicit
//! instants and never reads a clock, so any event loop can drive it.
//! [`StickyDateDriver`] runs one on a tokio task and publishes every
//! transition on a watch channel.

use std::time::Duration;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::Instant,
};

use super::config::StickyConfig;

/// What the render layer should animate the label toward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickyDateState {
    pub visible: bool,
    pub top_offset_percent: f32,
    /// How long the move toward this state should take.
    pub transition: Duration,
}

impl StickyDateState {
    fn shown() -> Self {
        Self {
            visible: true,
            top_offset_percent: 0.0,
            transition: Duration::ZERO,
        }
    }
}

/// Two-state machine: visible while scrolling, hidden after an idle period.
#[derive(Debug, Clone)]
pub struct StickyDateController {
    config: StickyConfig,
    state: StickyDateState,
    deadline: Option<Instant>,
    torn_down: bool,
}

impl StickyDateController {
    /// Start visible with the idle timer armed from `now`.
    pub fn new(config: StickyConfig, now: Instant) -> Self {
        let deadline = Some(now + config.idle);
        Self {
            config,
            state: StickyDateState::shown(),
            deadline,
            torn_down: false,
        }
    }

    pub fn state(&self) -> StickyDateState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state.visible
    }

    /// When the pending idle timer fires, if one is armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Handle a scroll event. Returns the new state if the label reappeared.
    pub fn on_scroll(&mut self, now: Instant) -> Option<StickyDateState> {
        if self.torn_down {
            return None;
        }

        // One timer per controller: re-arming replaces the pending one.
        self.deadline = Some(now + self.config.idle);

        if self.state.visible {
            return None;
        }
        self.state = StickyDateState::shown();
        log::trace!("sticky date shown");
        Some(self.state)
    }

    /// The displayed content changed; rerun the scroll handler once.
    pub fn dependencies_changed(&mut self, now: Instant) -> Option<StickyDateState> {
        self.on_scroll(now)
    }

    /// Fire the idle timer if it is due. Returns the new state on transition.
    pub fn poll(&mut self, now: Instant) -> Option<StickyDateState> {
        if self.torn_down {
            return None;
        }
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                if !self.state.visible {
                    return None;
                }
                self.state = StickyDateState {
                    visible: false,
                    top_offset_percent: self.config.hidden_offset(),
                    transition: self.config.hide_duration,
                };
                log::trace!("sticky date hidden");
                Some(self.state)
            }
            _ => None,
        }
    }

    /// Disarm the timer and ignore every later event.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.deadline = None;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

#[derive(Debug, Clone, Copy)]
enum StickyEvent {
    Scroll,
    DependenciesChanged,
}

/// A [`StickyDateController`] running on its own tokio task.
///
/// Dropping the driver aborts the task; no transition is published afterwards.
#[derive(Debug)]
pub struct StickyDateDriver {
    events: mpsc::UnboundedSender<StickyEvent>,
    state: watch::Receiver<StickyDateState>,
    task: JoinHandle<()>,
}

impl StickyDateDriver {
    /// Start a driver. Must be called within a tokio runtime.
    pub fn spawn(config: StickyConfig) -> Self {
        let mut machine = StickyDateController::new(config, Instant::now());
        let (events, mut rx) = mpsc::unbounded_channel();
        let (tx, state) = watch::channel(machine.state());

        let task = tokio::spawn(async move {
            loop {
                let deadline = machine.deadline();
                let timer = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now));

                let changed = tokio::select! {
                    event = rx.recv() => {
                        let Some(event) = event else { break };
                        let now = Instant::now();
                        match event {
                            StickyEvent::Scroll => machine.on_scroll(now),
                            StickyEvent::DependenciesChanged => machine.dependencies_changed(now),
                        }
                    }
                    _ = timer, if deadline.is_some() => machine.poll(Instant::now()),
                };

                if let Some(next) = changed {
                    tx.send_replace(next);
                }
            }
        });

        Self {
            events,
            state,
            task,
        }
    }

    /// Report a scroll event from the observed container.
    pub fn scroll(&self) {
        let _ = self.events.send(StickyEvent::Scroll);
    }

    /// Report that the displayed feed changed.
    pub fn dependencies_changed(&self) {
        let _ = self.events.send(StickyEvent::DependenciesChanged);
    }

    /// Latest published state.
    pub fn state(&self) -> StickyDateState {
        *self.state.borrow()
    }

    /// Receiver that wakes on every transition.
    pub fn subscribe(&self) -> watch::Receiver<StickyDateState> {
        self.state.clone()
    }

    /// Stop the driver.
    pub fn teardown(self) {
        drop(self);
    }
}

impl Drop for StickyDateDriver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::config::Layout;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_hides_after_idle() {
        let t0 = Instant::now();
        let mut sticky = StickyDateController::new(StickyConfig::default(), t0);
        assert!(sticky.is_visible());

        assert_eq!(sticky.poll(t0 + ms(1499)), None);
        let hidden = sticky.poll(t0 + ms(1500)).unwrap();
        assert!(!hidden.visible);
        assert_eq!(hidden.top_offset_percent, -100.0);
        assert_eq!(hidden.transition, ms(700));
        assert_eq!(sticky.deadline(), None);
    }

    #[test]
    fn test_scroll_resets_idle_timer() {
        let t0 = Instant::now();
        let mut sticky = StickyDateController::new(StickyConfig::default(), t0);

        // Already visible, so nothing to emit; only the timer moves.
        assert_eq!(sticky.on_scroll(t0 + ms(1000)), None);

        assert_eq!(sticky.poll(t0 + ms(1500)), None);
        assert_eq!(sticky.poll(t0 + ms(2499)), None);
        assert!(sticky.is_visible());
        assert!(sticky.poll(t0 + ms(2500)).is_some());
        assert!(!sticky.is_visible());
    }

    #[test]
    fn test_scroll_while_hidden_shows_immediately() {
        let t0 = Instant::now();
        let mut sticky = StickyDateController::new(StickyConfig::default(), t0);
        sticky.poll(t0 + ms(1500));

        let shown = sticky.on_scroll(t0 + ms(3000)).unwrap();
        assert!(shown.visible);
        assert_eq!(shown.top_offset_percent, 0.0);
        assert_eq!(shown.transition, Duration::ZERO);
        assert_eq!(sticky.deadline(), Some(t0 + ms(4500)));
    }

    #[test]
    fn test_dependencies_change_resets_like_scroll() {
        let t0 = Instant::now();
        let mut sticky = StickyDateController::new(StickyConfig::default(), t0);
        sticky.poll(t0 + ms(1500));

        assert!(sticky.dependencies_changed(t0 + ms(2000)).unwrap().visible);
        assert_eq!(sticky.deadline(), Some(t0 + ms(3500)));
    }

    #[test]
    fn test_mobile_offset() {
        let t0 = Instant::now();
        let config = StickyConfig {
            layout: Layout::Mobile,
            ..Default::default()
        };
        let mut sticky = StickyDateController::new(config, t0);

        assert_eq!(sticky.poll(t0 + ms(1500)).unwrap().top_offset_percent, -150.0);
    }

    #[test]
    fn test_teardown_silences() {
        let t0 = Instant::now();
        let mut sticky = StickyDateController::new(StickyConfig::default(), t0);
        sticky.teardown();

        assert_eq!(sticky.poll(t0 + ms(5000)), None);
        assert_eq!(sticky.on_scroll(t0 + ms(5000)), None);
        assert!(sticky.is_visible());
        assert!(sticky.is_torn_down());
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_follows_last_scroll() {
        let driver = StickyDateDriver::spawn(StickyConfig::default());
        let mut updates = driver.subscribe();

        tokio::time::sleep(ms(1000)).await;
        driver.scroll();
        tokio::time::sleep(ms(1000)).await;
        // 2000ms after start, 1000ms after the scroll.
        assert!(driver.state().visible);

        tokio::time::sleep(ms(600)).await;
        assert!(!driver.state().visible);

        updates.borrow_and_update();
        driver.scroll();
        updates.changed().await.unwrap();
        assert!(updates.borrow().visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_teardown_stops_transitions() {
        let driver = StickyDateDriver::spawn(StickyConfig::default());
        let updates = driver.subscribe();

        driver.teardown();
        tokio::time::sleep(ms(5000)).await;

        assert!(updates.borrow().visible);
    }
}
