//! Typewriter System - Looping type / hold / delete over a list of phrases
//!
//! Two layers:
//! - [`Typewriter`]: the pure state machine. Ask it for the next delay, call
//!   [`Typewriter::tick`] when that delay has passed.
//! - [`CyclingTypewriter`]: drives machines from a [`TimerSource`], keeping
//!   exactly one timer in flight per instance.
//!
//! # Cycle
//!
//! ```text
//! Typing ──full length──▶ HoldingFull ──2000ms──▶ Deleting ──empty──▶ next role, Typing
//!  +1 char / 100ms                                 -1 char / 50ms
//! ```
//!
//! A "character" is one extended grapheme cluster, so the displayed text is
//! always a valid prefix of the active role.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use spark_signals::{signal, Signal};
use unicode_segmentation::UnicodeSegmentation;

use crate::config::DEFAULT_CURSOR;
use crate::engine::{TimerId, TimerSource};

// =============================================================================
// TIMING
// =============================================================================

pub const TYPE_INTERVAL: Duration = Duration::from_millis(100);
pub const HOLD_DURATION: Duration = Duration::from_millis(2000);
pub const DELETE_INTERVAL: Duration = Duration::from_millis(50);

/// Delays between typewriter steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypewriterTiming {
    pub type_interval: Duration,
    pub hold: Duration,
    pub delete_interval: Duration,
}

impl Default for TypewriterTiming {
    fn default() -> Self {
        Self {
            type_interval: TYPE_INTERVAL,
            hold: HOLD_DURATION,
            delete_interval: DELETE_INTERVAL,
        }
    }
}

impl TypewriterTiming {
    /// Each interval is raised to at least 1ms, so a cycle always advances time.
    pub fn new(type_interval: Duration, hold: Duration, delete_interval: Duration) -> Self {
        let floor = Duration::from_millis(1);
        Self {
            type_interval: type_interval.max(floor),
            hold: hold.max(floor),
            delete_interval: delete_interval.max(floor),
        }
    }
}

// =============================================================================
// STATE MACHINE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypewriterPhase {
    Typing,
    /// Full role shown, waiting before deleting.
    HoldingFull,
    Deleting,
}

/// Pure typewriter state.
#[derive(Debug, Clone, PartialEq)]
pub struct Typewriter {
    roles: Vec<String>,
    active_index: usize,
    /// Byte length of the shown prefix, always on a grapheme boundary.
    shown: usize,
    phase: TypewriterPhase,
    timing: TypewriterTiming,
}

impl Typewriter {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_timing(roles, TypewriterTiming::default())
    }

    pub fn with_timing<I, S>(roles: I, timing: TypewriterTiming) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut machine = Self {
            roles: roles.into_iter().map(Into::into).collect(),
            active_index: 0,
            shown: 0,
            phase: TypewriterPhase::Typing,
            timing,
        };
        machine.settle();
        machine
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn timing(&self) -> TypewriterTiming {
        self.timing
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn phase(&self) -> TypewriterPhase {
        self.phase
    }

    /// True when there is nothing to type.
    pub fn is_idle(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn active_role(&self) -> Option<&str> {
        self.roles.get(self.active_index).map(String::as_str)
    }

    /// Currently shown prefix of the active role ("" when idle).
    pub fn displayed_text(&self) -> &str {
        self.active_role().map(|role| &role[..self.shown]).unwrap_or("")
    }

    /// Replace the roles and restart from the first one.
    pub fn set_roles<I, S>(&mut self, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self.reset();
    }

    /// Back to the first role, empty text, typing.
    pub fn reset(&mut self) {
        self.active_index = 0;
        self.shown = 0;
        self.phase = TypewriterPhase::Typing;
        self.settle();
    }

    /// Delay before the next [`tick`](Self::tick), or `None` when idle.
    pub fn next_delay(&self) -> Option<Duration> {
        if self.is_idle() {
            return None;
        }
        Some(match self.phase {
            TypewriterPhase::Typing => self.timing.type_interval,
            TypewriterPhase::HoldingFull => self.timing.hold,
            TypewriterPhase::Deleting => self.timing.delete_interval,
        })
    }

    /// Apply the step the last delay was waiting for.
    pub fn tick(&mut self) {
        let Some(role) = self.roles.get(self.active_index) else {
            return;
        };

        match self.phase {
            TypewriterPhase::Typing => {
                if let Some(next) = role[self.shown..].graphemes(true).next() {
                    self.shown += next.len();
                }
            }
            TypewriterPhase::HoldingFull => {
                self.phase = TypewriterPhase::Deleting;
            }
            TypewriterPhase::Deleting => {
                if let Some(last) = role[..self.shown].graphemes(true).next_back() {
                    self.shown -= last.len();
                }
            }
        }

        self.settle();
    }

    /// Take the transitions that need no wait.
    fn settle(&mut self) {
        if self.roles.is_empty() {
            self.active_index = 0;
            self.shown = 0;
            self.phase = TypewriterPhase::Typing;
            return;
        }

        if self.phase == TypewriterPhase::Deleting && self.shown == 0 {
            self.active_index = (self.active_index + 1) % self.roles.len();
            self.phase = TypewriterPhase::Typing;
        }

        let full = self.roles[self.active_index].len();
        if self.phase == TypewriterPhase::Typing && self.shown >= full {
            self.shown = full;
            self.phase = TypewriterPhase::HoldingFull;
        }
    }
}

// =============================================================================
// DRIVER
// =============================================================================

struct TypewriterInner {
    machine: Typewriter,
    timer: Option<TimerId>,
    stopped: bool,
    timers: Rc<dyn TimerSource>,
}

/// Owner of one running typewriter.
///
/// Dropping the handle stops it.
pub struct TypewriterHandle {
    inner: Rc<RefCell<TypewriterInner>>,
    text: Signal<String>,
    cursor: String,
}

impl TypewriterHandle {
    pub fn displayed_text(&self) -> String {
        self.text.get()
    }

    /// Reactive displayed text.
    pub fn text_signal(&self) -> Signal<String> {
        self.text.clone()
    }

    /// Cursor glyph shown after the text while running ("" once stopped).
    pub fn cursor(&self) -> &str {
        if self.is_running() { self.cursor.as_str() } else { "" }
    }

    pub fn active_index(&self) -> usize {
        self.inner.borrow().machine.active_index()
    }

    pub fn phase(&self) -> TypewriterPhase {
        self.inner.borrow().machine.phase()
    }

    pub fn roles(&self) -> Vec<String> {
        self.inner.borrow().machine.roles().to_vec()
    }

    pub fn is_running(&self) -> bool {
        !self.inner.borrow().stopped
    }

    /// Swap the roles (e.g. after content loads) and restart the cycle.
    ///
    /// An empty list leaves the typewriter idle with no timer scheduled.
    pub fn set_roles<I, S>(&self, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (stale, timers) = {
            let mut inner = self.inner.borrow_mut();
            if inner.stopped {
                return;
            }
            inner.machine.set_roles(roles);
            (inner.timer.take(), inner.timers.clone())
        };

        if let Some(id) = stale {
            timers.cancel(id);
        }
        tracing::debug!(roles = self.inner.borrow().machine.roles().len(), "typewriter roles replaced");

        publish(&self.inner, &self.text);
        schedule_next(&self.inner, &self.text);
    }

    /// Cancel the in-flight timer. Idempotent.
    pub fn stop(&self) {
        let (timer, timers) = {
            let mut inner = self.inner.borrow_mut();
            if inner.stopped {
                return;
            }
            inner.stopped = true;
            (inner.timer.take(), inner.timers.clone())
        };

        if let Some(id) = timer {
            timers.cancel(id);
        }
        tracing::debug!("typewriter stopped");
    }
}

impl Drop for TypewriterHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Starts typewriters on a timer source.
pub struct CyclingTypewriter {
    timers: Rc<dyn TimerSource>,
    timing: TypewriterTiming,
    cursor: String,
}

impl CyclingTypewriter {
    pub fn new(timers: Rc<dyn TimerSource>) -> Self {
        Self {
            timers,
            timing: TypewriterTiming::default(),
            cursor: DEFAULT_CURSOR.to_string(),
        }
    }

    pub fn with_timing(mut self, timing: TypewriterTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = cursor.into();
        self
    }

    /// Begin cycling at the first role with an empty prefix.
    pub fn start<I, S>(&self, roles: I) -> TypewriterHandle
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let machine = Typewriter::with_timing(roles, self.timing);
        let text = signal(machine.displayed_text().to_string());
        tracing::debug!(roles = machine.roles().len(), "typewriter started");

        let inner = Rc::new(RefCell::new(TypewriterInner {
            machine,
            timer: None,
            stopped: false,
            timers: self.timers.clone(),
        }));
        schedule_next(&inner, &text);

        TypewriterHandle {
            inner,
            text,
            cursor: self.cursor.clone(),
        }
    }

    /// Same as [`TypewriterHandle::stop`].
    pub fn stop(&self, handle: &TypewriterHandle) {
        handle.stop();
    }
}

fn publish(inner: &Rc<RefCell<TypewriterInner>>, text: &Signal<String>) {
    let current = inner.borrow().machine.displayed_text().to_string();
    text.set(current);
}

fn schedule_next(inner_rc: &Rc<RefCell<TypewriterInner>>, text: &Signal<String>) {
    let (delay, timers) = {
        let inner = inner_rc.borrow();
        if inner.stopped || inner.timer.is_some() {
            return;
        }
        match inner.machine.next_delay() {
            Some(delay) => (delay, inner.timers.clone()),
            None => return,
        }
    };

    let weak = Rc::downgrade(inner_rc);
    let text_for_cb = text.clone();
    let id = timers.schedule(delay, Box::new(move || on_tick(&weak, &text_for_cb)));
    inner_rc.borrow_mut().timer = Some(id);
}

fn on_tick(weak: &Weak<RefCell<TypewriterInner>>, text: &Signal<String>) {
    let Some(inner_rc) = weak.upgrade() else {
        return;
    };

    {
        let mut inner = inner_rc.borrow_mut();
        if inner.stopped {
            return;
        }
        inner.timer = None;
        inner.machine.tick();
        tracing::trace!(
            index = inner.machine.active_index(),
            phase = ?inner.machine.phase(),
            text = inner.machine.displayed_text(),
            "typewriter tick"
        );
    }

    publish(&inner_rc, text);
    schedule_next(&inner_rc, text);
}

// =============================================================================
// TESTS
// =============================================================================
