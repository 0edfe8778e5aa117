//! Reveal System - One-shot scroll-triggered enter transitions
//!
//! An attached element starts hidden and offset in its [`Direction`]. The
//! first time it is reported at or above its visibility threshold it arms;
//! once the delay elapses it is revealed for good.
//!
//! ```text
//! Pending ──enters view──▶ Armed ──delay elapses──▶ Revealed
//!    │                       │
//!    └──────── detach ───────┴──▶ (frozen, no change reported)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use folio_motion::engine::{TimerQueue, Viewport};
//! use folio_motion::types::Rect;
//! use folio_motion::state::{RevealController, RevealConfig};
//!
//! let viewport = Viewport::new(1280.0, 720.0);
//! let timers = TimerQueue::new();
//! let controller = RevealController::new(Rc::new(viewport.clone()), Rc::new(timers.clone()));
//!
//! let about = viewport.insert_element(Rect::new(0.0, 900.0, 1280.0, 600.0));
//! let handle = controller.attach(about, RevealConfig::default());
//!
//! viewport.scroll_to(0.0, 400.0);  // enters view, no delay
//! assert!(handle.state().is_revealed());
//! assert_eq!(handle.style().opacity, 1.0);
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use spark_signals::{signal, Signal};

use crate::config::{DEFAULT_DURATION_SECS, DEFAULT_ROOT_MARGIN_PX, DEFAULT_THRESHOLD};
use crate::engine::{
    IntersectionEntry, IntersectionSource, ObserverId, ObserverOptions, TimerId, TimerSource,
};
use crate::error::{MotionError, Result};
use crate::types::{Direction, ElementId, RevealState, RevealStyle};

// =============================================================================
// CONFIG
// =============================================================================

/// Per-instance reveal parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealConfig {
    pub direction: Direction,
    /// Wait between entering view and starting the transition.
    pub delay: Duration,
    /// Length of the transition, in seconds. Must be positive.
    pub duration_secs: f32,
    /// Minimum visible fraction that counts as "entered", in [0, 1].
    pub threshold: f32,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            direction: Direction::Left,
            delay: Duration::ZERO,
            duration_secs: DEFAULT_DURATION_SECS,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl RevealConfig {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }

    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay = Duration::from_millis(delay_ms);
        self
    }

    pub fn with_duration_secs(mut self, duration_secs: f32) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.duration_secs.is_finite() && self.duration_secs > 0.0) {
            return Err(MotionError::InvalidConfig(format!(
                "reveal duration must be positive, got {}",
                self.duration_secs
            )));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(MotionError::InvalidConfig(format!(
                "reveal threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Copy with out-of-range values replaced. Never fails.
    pub fn sanitized(self) -> Self {
        let duration_secs = if self.duration_secs.is_finite() && self.duration_secs > 0.0 {
            self.duration_secs
        } else {
            tracing::warn!(duration = self.duration_secs, "invalid reveal duration, using default");
            DEFAULT_DURATION_SECS
        };

        let threshold = if self.threshold.is_nan() {
            tracing::warn!("NaN reveal threshold, using default");
            DEFAULT_THRESHOLD
        } else {
            self.threshold.clamp(0.0, 1.0)
        };

        Self {
            duration_secs,
            threshold,
            ..self
        }
    }
}

// =============================================================================
// INSTANCE STATE
// =============================================================================

struct RevealInner {
    element: ElementId,
    config: RevealConfig,
    state: RevealState,
    observer: Option<ObserverId>,
    timer: Option<TimerId>,
    detached: bool,
    viewport: Rc<dyn IntersectionSource>,
    timers: Rc<dyn TimerSource>,
}

/// Owner of one reveal instance.
///
/// Dropping the handle detaches it, so keep it alive as long as the element
/// is mounted.
pub struct RevealHandle {
    inner: Rc<RefCell<RevealInner>>,
    state: Signal<RevealState>,
    config: RevealConfig,
    reduced_motion: bool,
}

impl RevealHandle {
    pub fn element(&self) -> ElementId {
        self.inner.borrow().element
    }

    pub fn config(&self) -> RevealConfig {
        self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RevealState {
        self.state.get()
    }

    /// Reactive state, for hosts that render through effects.
    pub fn state_signal(&self) -> Signal<RevealState> {
        self.state.clone()
    }

    /// Target presentation for the current state.
    pub fn style(&self) -> RevealStyle {
        let duration = if self.reduced_motion {
            0.0
        } else {
            self.config.duration_secs
        };
        self.state().style(self.config.direction, duration)
    }

    /// Whether the instance still holds a watcher or timer.
    pub fn is_active(&self) -> bool {
        let inner = self.inner.borrow();
        inner.observer.is_some() || inner.timer.is_some()
    }

    pub fn is_detached(&self) -> bool {
        self.inner.borrow().detached
    }

    /// Stop observing and cancel any pending timer.
    ///
    /// Idempotent. The reported state is left exactly as it was.
    pub fn detach(&self) {
        let (observer, timer, viewport, timers) = {
            let mut inner = self.inner.borrow_mut();
            if inner.detached {
                return;
            }
            inner.detached = true;
            (
                inner.observer.take(),
                inner.timer.take(),
                inner.viewport.clone(),
                inner.timers.clone(),
            )
        };

        if let Some(id) = timer {
            timers.cancel(id);
        }
        if let Some(id) = observer {
            viewport.unobserve(id);
        }
        tracing::debug!(element = ?self.element(), state = ?self.state(), "reveal detached");
    }
}

impl Drop for RevealHandle {
    fn drop(&mut self) {
        self.detach();
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

/// Attaches reveal instances to elements of one viewport.
pub struct RevealController {
    viewport: Rc<dyn IntersectionSource>,
    timers: Rc<dyn TimerSource>,
    root_margin: f32,
    reduced_motion: bool,
}

impl RevealController {
    pub fn new(viewport: Rc<dyn IntersectionSource>, timers: Rc<dyn TimerSource>) -> Self {
        Self {
            viewport,
            timers,
            root_margin: DEFAULT_ROOT_MARGIN_PX,
            reduced_motion: false,
        }
    }

    /// Override the look-ahead margin around the viewport.
    pub fn with_root_margin(mut self, margin_px: f32) -> Self {
        self.root_margin = if margin_px.is_finite() {
            margin_px
        } else {
            DEFAULT_ROOT_MARGIN_PX
        };
        self
    }

    /// Report zero-length transitions from every handle.
    pub fn with_reduced_motion(mut self, reduced_motion: bool) -> Self {
        self.reduced_motion = reduced_motion;
        self
    }

    pub fn root_margin(&self) -> f32 {
        self.root_margin
    }

    /// Start watching `element`.
    pub fn attach(&self, element: ElementId, config: RevealConfig) -> RevealHandle {
        let config = config.sanitized();
        let state = signal(RevealState::Pending);

        let inner = Rc::new(RefCell::new(RevealInner {
            element,
            config,
            state: RevealState::Pending,
            observer: None,
            timer: None,
            detached: false,
            viewport: self.viewport.clone(),
            timers: self.timers.clone(),
        }));

        let weak = Rc::downgrade(&inner);
        let state_for_cb = state.clone();
        let options = ObserverOptions {
            threshold: config.threshold,
            root_margin: self.root_margin,
        };
        let observer = self.viewport.observe(
            element,
            options,
            Box::new(move |entry| on_intersection(&weak, &state_for_cb, entry)),
        );
        inner.borrow_mut().observer = Some(observer);

        tracing::debug!(?element, direction = %config.direction, delay_ms = config.delay.as_millis() as u64, "reveal attached");

        RevealHandle {
            inner,
            state,
            config,
            reduced_motion: self.reduced_motion,
        }
    }

    /// Same as [`RevealHandle::detach`].
    pub fn detach(&self, handle: &RevealHandle) {
        handle.detach();
    }
}

// =============================================================================
// TRANSITIONS
// =============================================================================

fn on_intersection(
    weak: &Weak<RefCell<RevealInner>>,
    state: &Signal<RevealState>,
    entry: IntersectionEntry,
) {
    let Some(inner_rc) = weak.upgrade() else {
        return;
    };

    let (delay, timers) = {
        let mut inner = inner_rc.borrow_mut();
        if inner.detached || inner.state != RevealState::Pending {
            return;
        }
        if !entry.meets(inner.config.threshold) {
            return;
        }
        inner.state = RevealState::Armed;
        tracing::trace!(element = ?inner.element, ratio = entry.ratio, "reveal armed");
        (inner.config.delay, inner.timers.clone())
    };

    if delay.is_zero() {
        reveal(&inner_rc, state);
        return;
    }

    state.set(RevealState::Armed);

    let weak = Rc::downgrade(&inner_rc);
    let state = state.clone();
    let id = timers.schedule(
        delay,
        Box::new(move || {
            if let Some(inner_rc) = weak.upgrade() {
                reveal(&inner_rc, &state);
            }
        }),
    );
    inner_rc.borrow_mut().timer = Some(id);
}

/// Armed -> Revealed, then drop the watcher.
fn reveal(inner_rc: &Rc<RefCell<RevealInner>>, state: &Signal<RevealState>) {
    let (observer, viewport) = {
        let mut inner = inner_rc.borrow_mut();
        if inner.detached || inner.state != RevealState::Armed {
            return;
        }
        inner.state = RevealState::Revealed;
        inner.timer = None;
        tracing::trace!(element = ?inner.element, "reveal started");
        (inner.observer.take(), inner.viewport.clone())
    };

    if let Some(id) = observer {
        viewport.unobserve(id);
    }
    state.set(RevealState::Revealed);
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{TimerQueue, Viewport};
    use crate::types::{Offset, Rect};
    use spark_signals::effect;
    use std::cell::Cell;

    struct Page {
        viewport: Viewport,
        timers: TimerQueue,
        controller: RevealController,
        /// 200px section at y=1000 on a 3000px page, 800x600 root.
        section: ElementId,
    }

    fn setup() -> Page {
        let viewport = Viewport::new(800.0, 600.0);
        let timers = TimerQueue::new();
        viewport.insert_element(Rect::new(0.0, 0.0, 800.0, 3000.0));
        let section = viewport.insert_element(Rect::new(0.0, 1000.0, 800.0, 200.0));
        let controller = RevealController::new(Rc::new(viewport.clone()), Rc::new(timers.clone()));
        Page {
            viewport,
            timers,
            controller,
            section,
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Scroll so the section is fully on screen.
    fn bring_into_view(page: &Page) {
        page.viewport.scroll_to(0.0, 900.0);
    }

    #[test]
    fn test_starts_pending_and_hidden() {
        let page = setup();
        let handle = page.controller.attach(page.section, RevealConfig::new(Direction::Right));
        page.viewport.flush();

        assert_eq!(handle.state(), RevealState::Pending);
        let style = handle.style();
        assert_eq!(style.opacity, 0.0);
        assert_eq!(style.offset, Offset::new(100.0, 0.0));
        assert!(handle.is_active());
    }

    #[test]
    fn test_direction_mapping_while_pending() {
        let page = setup();
        for direction in Direction::ALL {
            let handle = page.controller.attach(page.section, RevealConfig::new(direction));
            assert_eq!(handle.style().offset, direction.initial_offset());
            assert_eq!(handle.style().opacity, 0.0);
        }
    }

    #[test]
    fn test_up_with_zero_delay_reveals_on_entry() {
        let page = setup();
        let handle = page.controller.attach(page.section, RevealConfig::new(Direction::Up));

        bring_into_view(&page);

        assert_eq!(handle.state(), RevealState::Revealed);
        let style = handle.style();
        assert!(style.offset.is_zero());
        assert_eq!(style.opacity, 1.0);
        assert_eq!(page.timers.pending_count(), 0);
        assert!(!handle.is_active());
    }

    #[test]
    fn test_delay_respected() {
        let page = setup();
        let handle = page
            .controller
            .attach(page.section, RevealConfig::new(Direction::Left).with_delay_ms(200));

        page.timers.advance(ms(1000));
        bring_into_view(&page);
        assert_eq!(handle.state(), RevealState::Armed);

        page.timers.advance(ms(199));
        assert_eq!(handle.state(), RevealState::Armed);
        assert_eq!(handle.style().opacity, 0.0);

        page.timers.advance(ms(1));
        assert_eq!(handle.state(), RevealState::Revealed);
        assert_eq!(page.viewport.observer_count(), 0);
    }

    #[test]
    fn test_below_threshold_stays_pending() {
        let page = setup();
        let handle = page
            .controller
            .attach(page.section, RevealConfig::new(Direction::Down).with_threshold(0.5));

        // Root + 50px margin covers 1000..1060: 30% of the section
        page.viewport.scroll_to(0.0, 410.0);
        assert_eq!(handle.state(), RevealState::Pending);

        page.viewport.scroll_to(0.0, 560.0);
        assert_eq!(handle.state(), RevealState::Revealed);
    }

    #[test]
    fn test_margin_reveals_before_on_screen() {
        let page = setup();
        let handle = page
            .controller
            .attach(page.section, RevealConfig::new(Direction::Fade).with_threshold(0.0));

        // Section top is 20px below the root, inside the 50px margin
        page.viewport.scroll_to(0.0, 380.0);
        assert_eq!(page.viewport.intersection_ratio(page.section), Some(0.0));
        assert_eq!(handle.state(), RevealState::Revealed);
    }

    #[test]
    fn test_one_shot_survives_leaving_view() {
        let page = setup();
        let handle = page.controller.attach(page.section, RevealConfig::new(Direction::Left));

        bring_into_view(&page);
        assert!(handle.state().is_revealed());
        let revealed = handle.style();

        for y in [0.0, 900.0, 2400.0, 0.0, 950.0] {
            page.viewport.scroll_to(0.0, y);
            page.timers.advance(ms(500));
            assert_eq!(handle.style(), revealed);
        }
    }

    #[test]
    fn test_leaving_while_armed_still_reveals() {
        let page = setup();
        let handle = page
            .controller
            .attach(page.section, RevealConfig::new(Direction::Up).with_delay_ms(300));

        bring_into_view(&page);
        page.viewport.scroll_to_top();
        assert_eq!(handle.state(), RevealState::Armed);

        page.timers.advance(ms(300));
        assert_eq!(handle.state(), RevealState::Revealed);
    }

    #[test]
    fn test_reentry_while_armed_does_not_reschedule() {
        let page = setup();
        let _handle = page
            .controller
            .attach(page.section, RevealConfig::new(Direction::Up).with_delay_ms(300));

        bring_into_view(&page);
        page.viewport.scroll_to_top();
        bring_into_view(&page);

        assert_eq!(page.timers.pending_count(), 1);
    }

    #[test]
    fn test_detach_while_pending() {
        let page = setup();
        let handle = page.controller.attach(page.section, RevealConfig::new(Direction::Left));

        page.controller.detach(&handle);
        assert_eq!(page.viewport.observer_count(), 0);

        bring_into_view(&page);
        assert_eq!(handle.state(), RevealState::Pending);
        assert!(handle.is_detached());
    }

    #[test]
    fn test_detach_while_armed_cancels_timer() {
        let page = setup();
        let handle = page
            .controller
            .attach(page.section, RevealConfig::new(Direction::Left).with_delay_ms(500));

        bring_into_view(&page);
        assert_eq!(handle.state(), RevealState::Armed);

        handle.detach();
        assert_eq!(page.timers.pending_count(), 0);

        page.timers.advance(ms(10_000));
        assert_eq!(handle.state(), RevealState::Armed);
        assert_eq!(handle.style().opacity, 0.0);
    }

    #[test]
    fn test_double_detach_is_noop() {
        let page = setup();
        let handle = page.controller.attach(page.section, RevealConfig::default());

        bring_into_view(&page);
        handle.detach();
        handle.detach();
        page.controller.detach(&handle);

        assert!(handle.state().is_revealed());
    }

    #[test]
    fn test_drop_detaches() {
        let page = setup();
        {
            let _handle = page
                .controller
                .attach(page.section, RevealConfig::default().with_delay_ms(100));
            bring_into_view(&page);
            assert_eq!(page.timers.pending_count(), 1);
        }
        assert_eq!(page.timers.pending_count(), 0);
        assert_eq!(page.viewport.observer_count(), 0);
    }

    #[test]
    fn test_no_changes_after_detach() {
        let page = setup();
        let handle = page
            .controller
            .attach(page.section, RevealConfig::default().with_delay_ms(100));

        let changes = Rc::new(Cell::new(0));
        let count = changes.clone();
        let sig = handle.state_signal();
        let _e = effect(move || {
            let _ = sig.get();
            count.set(count.get() + 1);
        });
        assert_eq!(changes.get(), 1);

        bring_into_view(&page);
        assert_eq!(changes.get(), 2);

        handle.detach();
        page.timers.advance(ms(5_000));
        page.viewport.scroll_to_top();
        bring_into_view(&page);
        assert_eq!(changes.get(), 2);
    }

    #[test]
    fn test_removed_element_stays_pending() {
        let page = setup();
        let handle = page.controller.attach(page.section, RevealConfig::default());

        page.viewport.remove_element(page.section);
        bring_into_view(&page);
        assert_eq!(handle.state(), RevealState::Pending);

        handle.detach();
        assert!(handle.is_detached());
    }

    #[test]
    fn test_instances_are_independent() {
        let page = setup();
        let lower = page.viewport.insert_element(Rect::new(0.0, 2500.0, 800.0, 300.0));

        let a = page.controller.attach(page.section, RevealConfig::default());
        let b = page.controller.attach(lower, RevealConfig::default());

        bring_into_view(&page);
        assert!(a.state().is_revealed());
        assert_eq!(b.state(), RevealState::Pending);

        a.detach();
        page.viewport.scroll_to_bottom();
        assert!(b.state().is_revealed());
    }

    #[test]
    fn test_sanitizes_config() {
        let config = RevealConfig::default()
            .with_threshold(3.0)
            .with_duration_secs(-1.0)
            .sanitized();
        assert_eq!(config.threshold, 1.0);
        assert_eq!(config.duration_secs, DEFAULT_DURATION_SECS);

        assert!(RevealConfig::default().with_threshold(-0.1).validate().is_err());
        assert!(RevealConfig::default().with_duration_secs(0.0).validate().is_err());
        assert!(RevealConfig::default().validate().is_ok());
    }

    #[test]
    fn test_reduced_motion_zero_duration() {
        let page = setup();
        let controller = RevealController::new(
            Rc::new(page.viewport.clone()),
            Rc::new(page.timers.clone()),
        )
        .with_reduced_motion(true);

        let handle = controller.attach(page.section, RevealConfig::default());
        assert_eq!(handle.style().duration_secs, 0.0);
    }

    #[test]
    fn test_removed_element_while_armed() {
        let page = setup();
        let handle = page
            .controller
            .attach(page.section, RevealConfig::default().with_delay_ms(300));
        bring_into_view(&page);
        assert_eq!(handle.state(), RevealState::Armed);

        // The timer was already running when the element went away
        assert!(page.viewport.remove_element(page.section));
        page.timers.advance(ms(300));
        assert_eq!(handle.state(), RevealState::Revealed);
        assert_eq!(page.viewport.observer_count(), 0);

        handle.detach();
        assert!(handle.is_detached());
        assert_eq!(page.timers.pending_count(), 0);
    }

    #[test]
    fn test_root_margin_override() {
        let page = setup();
        let tight = RevealController::new(
            Rc::new(page.viewport.clone()),
            Rc::new(page.timers.clone()),
        )
        .with_root_margin(0.0);
        assert_eq!(page.controller.root_margin(), DEFAULT_ROOT_MARGIN_PX);
        assert_eq!(tight.root_margin(), 0.0);

        let early = page.controller.attach(page.section, RevealConfig::default());
        let late = tight.attach(page.section, RevealConfig::default());

        // Root bottom at 990: 40px (20%) inside the default margin, none without
        page.viewport.scroll_to(0.0, 390.0);
        assert!(early.state().is_revealed());
        assert_eq!(late.state(), RevealState::Pending);

        let fallback = RevealController::new(
            Rc::new(page.viewport.clone()),
            Rc::new(page.timers.clone()),
        )
        .with_root_margin(f32::NAN);
        assert_eq!(fallback.root_margin(), DEFAULT_ROOT_MARGIN_PX);
    }

    #[test]
    fn test_scrolling_from_effect_does_not_arm_offscreen_section() {
        let page = setup();
        let top = page.viewport.insert_element(Rect::new(0.0, 0.0, 800.0, 200.0));
        let next = page.viewport.insert_element(Rect::new(0.0, 300.0, 800.0, 200.0));

        let first = page.controller.attach(top, RevealConfig::default());
        let second = page
            .controller
            .attach(next, RevealConfig::default().with_delay_ms(100));

        // Host jumps down the page once the first section shows
        let sig = first.state_signal();
        let vp = page.viewport.clone();
        let _e = effect(move || {
            if sig.get().is_revealed() {
                vp.scroll_to(0.0, 2000.0);
            }
        });

        page.viewport.flush();
        assert!(first.state().is_revealed());
        assert_eq!(page.viewport.intersection_ratio(next), Some(0.0));
        assert_eq!(second.state(), RevealState::Pending);

        page.timers.advance(ms(100));
        assert_eq!(second.state(), RevealState::Pending);
    }
}
