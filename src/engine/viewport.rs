//! Viewport - Scrollable root and intersection observation.
//!
//! Models a scrolling page:
//! - Element rects in document coordinates
//! - Root rect (size + scroll offset), clamped to the content extent
//! - Intersection ratio per observer, with a per-observer root margin
//! - Threshold-crossing notifications, delivered on [`Viewport::flush`]
//!
//! Any other source with the same semantics can stand in through the
//! [`IntersectionSource`] trait.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::types::{ElementId, Rect};

/// Upper bound on re-evaluation passes when callbacks keep moving the root.
const MAX_FLUSH_PASSES: usize = 16;

// =============================================================================
// Intersection Source Contract
// =============================================================================

/// Handle to an intersection watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

/// Options for a single watcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverOptions {
    /// Minimum visible fraction, in [0, 1].
    pub threshold: f32,
    /// Pixels added around the root on every side before intersecting.
    pub root_margin: f32,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            root_margin: 0.0,
        }
    }
}

/// One notification delivered to a watcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub target: ElementId,
    /// Visible fraction of the target, in [0, 1].
    pub ratio: f32,
    /// Whether the target touches the (margin-expanded) root at all.
    pub is_intersecting: bool,
}

impl IntersectionEntry {
    /// Whether this entry satisfies `threshold`.
    #[inline]
    pub fn meets(&self, threshold: f32) -> bool {
        self.is_intersecting && self.ratio >= threshold
    }
}

pub type IntersectionCallback = Box<dyn FnMut(IntersectionEntry)>;

/// Watches elements entering and leaving a root.
pub trait IntersectionSource {
    /// Start watching `target`. The callback runs whenever the target's
    /// threshold status changes (including the first evaluation).
    fn observe(
        &self,
        target: ElementId,
        options: ObserverOptions,
        callback: IntersectionCallback,
    ) -> ObserverId;

    /// Stop watching. Returns `false` if the id was not active.
    fn unobserve(&self, id: ObserverId) -> bool;
}

// =============================================================================
// Viewport State
// =============================================================================

struct Observer {
    target: ElementId,
    options: ObserverOptions,
    /// Taken out while the callback runs.
    callback: Option<IntersectionCallback>,
    /// Threshold status at the last delivery (None = never evaluated).
    last_met: Option<bool>,
}

struct ViewportState {
    width: f32,
    height: f32,
    scroll_x: f32,
    scroll_y: f32,
    elements: HashMap<ElementId, Rect>,
    next_element: u32,
    observers: BTreeMap<u64, Observer>,
    next_observer: u64,
    /// A flush is delivering callbacks.
    flushing: bool,
    /// Geometry changed while flushing.
    dirty: bool,
}

impl ViewportState {
    fn root(&self) -> Rect {
        Rect::new(self.scroll_x, self.scroll_y, self.width, self.height)
    }

    fn content_extent(&self) -> (f32, f32) {
        self.elements.values().fold((0.0f32, 0.0f32), |(w, h), r| {
            (w.max(r.right()), h.max(r.bottom()))
        })
    }

    fn max_scroll(&self) -> (f32, f32) {
        let (content_w, content_h) = self.content_extent();
        (
            (content_w - self.width).max(0.0),
            (content_h - self.height).max(0.0),
        )
    }

    fn clamp_scroll(&mut self) {
        let (max_x, max_y) = self.max_scroll();
        self.scroll_x = self.scroll_x.min(max_x);
        self.scroll_y = self.scroll_y.min(max_y);
    }

    fn entry_for(&self, target: ElementId, root_margin: f32) -> Option<IntersectionEntry> {
        let rect = self.elements.get(&target)?;
        let root = self.root().expand(root_margin);
        let (ratio, is_intersecting) = intersection_ratio(rect, &root);
        Some(IntersectionEntry {
            target,
            ratio,
            is_intersecting,
        })
    }
}

/// Visible fraction of `target` within `root`, and whether they touch.
fn intersection_ratio(target: &Rect, root: &Rect) -> (f32, bool) {
    match target.intersection(root) {
        None => (0.0, false),
        Some(overlap) => {
            let area = target.area();
            if area <= 0.0 {
                (1.0, true)
            } else {
                ((overlap.area() / area).clamp(0.0, 1.0), true)
            }
        }
    }
}

// =============================================================================
// Viewport
// =============================================================================

/// A scrollable root that element rects are measured against.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct Viewport {
    state: Rc<RefCell<ViewportState>>,
}

impl Viewport {
    /// Create a viewport of the given size, scrolled to the top.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            state: Rc::new(RefCell::new(ViewportState {
                width: width.max(0.0),
                height: height.max(0.0),
                scroll_x: 0.0,
                scroll_y: 0.0,
                elements: HashMap::new(),
                next_element: 0,
                observers: BTreeMap::new(),
                next_observer: 0,
                flushing: false,
                dirty: false,
            })),
        }
    }

    // -------------------------------------------------------------------------
    // Elements
    // -------------------------------------------------------------------------

    /// Register an element at `rect` (document coordinates).
    pub fn insert_element(&self, rect: Rect) -> ElementId {
        let mut state = self.state.borrow_mut();
        let id = ElementId(state.next_element);
        state.next_element += 1;
        state.elements.insert(id, rect);
        id
    }

    /// Move or resize an element. Returns `false` for unknown elements.
    pub fn set_element_rect(&self, id: ElementId, rect: Rect) -> bool {
        let updated = {
            let mut state = self.state.borrow_mut();
            match state.elements.get_mut(&id) {
                Some(existing) => {
                    *existing = rect;
                    true
                }
                None => false,
            }
        };
        if updated {
            self.flush();
        }
        updated
    }

    /// Remove an element from the document.
    ///
    /// Observers of the element stay registered but receive nothing further.
    /// Scroll offsets are re-clamped to the remaining content.
    pub fn remove_element(&self, id: ElementId) -> bool {
        let removed = {
            let mut state = self.state.borrow_mut();
            let removed = state.elements.remove(&id).is_some();
            if removed {
                state.clamp_scroll();
            }
            removed
        };
        if removed {
            self.flush();
        }
        removed
    }

    pub fn element_rect(&self, id: ElementId) -> Option<Rect> {
        self.state.borrow().elements.get(&id).copied()
    }

    /// Visible fraction of an element with no root margin.
    pub fn intersection_ratio(&self, id: ElementId) -> Option<f32> {
        self.state.borrow().entry_for(id, 0.0).map(|e| e.ratio)
    }

    /// Number of active watchers.
    pub fn observer_count(&self) -> usize {
        self.state.borrow().observers.len()
    }

    // -------------------------------------------------------------------------
    // Root geometry
    // -------------------------------------------------------------------------

    pub fn size(&self) -> (f32, f32) {
        let state = self.state.borrow();
        (state.width, state.height)
    }

    /// Resize the root. Scroll offsets are re-clamped.
    pub fn resize(&self, width: f32, height: f32) {
        {
            let mut state = self.state.borrow_mut();
            state.width = width.max(0.0);
            state.height = height.max(0.0);
            state.clamp_scroll();
        }
        self.flush();
    }

    /// Current scroll offset (x, y).
    pub fn scroll_offset(&self) -> (f32, f32) {
        let state = self.state.borrow();
        (state.scroll_x, state.scroll_y)
    }

    /// Maximum scroll offset (x, y) for the current content.
    pub fn max_scroll(&self) -> (f32, f32) {
        self.state.borrow().max_scroll()
    }

    // -------------------------------------------------------------------------
    // Scrolling
    // -------------------------------------------------------------------------

    /// Scroll to an absolute offset (clamped to valid range).
    pub fn scroll_to(&self, x: f32, y: f32) {
        {
            let mut state = self.state.borrow_mut();
            let (max_x, max_y) = state.max_scroll();
            state.scroll_x = x.clamp(0.0, max_x);
            state.scroll_y = y.clamp(0.0, max_y);
        }
        self.flush();
    }

    /// Scroll by a delta.
    ///
    /// Returns `true` if scrolling occurred, `false` if already at boundary.
    pub fn scroll_by(&self, delta_x: f32, delta_y: f32) -> bool {
        let moved = {
            let mut state = self.state.borrow_mut();
            let (max_x, max_y) = state.max_scroll();
            let new_x = (state.scroll_x + delta_x).clamp(0.0, max_x);
            let new_y = (state.scroll_y + delta_y).clamp(0.0, max_y);

            if new_x == state.scroll_x && new_y == state.scroll_y {
                false
            } else {
                state.scroll_x = new_x;
                state.scroll_y = new_y;
                true
            }
        };

        if moved {
            self.flush();
        }
        moved
    }

    /// Scroll to top (Y offset 0, X preserved).
    pub fn scroll_to_top(&self) {
        let (x, _) = self.scroll_offset();
        self.scroll_to(x, 0.0);
    }

    /// Scroll to bottom (Y offset max, X preserved).
    pub fn scroll_to_bottom(&self) {
        let (x, _) = self.scroll_offset();
        let (_, max_y) = self.max_scroll();
        self.scroll_to(x, max_y);
    }

    /// Scroll so that an element's top edge sits at the top of the root.
    pub fn scroll_into_view(&self, id: ElementId) -> bool {
        match self.element_rect(id) {
            Some(rect) => {
                let (x, _) = self.scroll_offset();
                self.scroll_to(x, rect.y);
                true
            }
            None => false,
        }
    }

    // -------------------------------------------------------------------------
    // Delivery
    // -------------------------------------------------------------------------

    /// Evaluate every watcher and deliver threshold-status changes.
    ///
    /// Scroll and resize operations call this themselves; call it directly
    /// once per frame so freshly attached watchers get their first report.
    /// Returns the number of callbacks run.
    ///
    /// A flush requested from inside a callback is folded into the running
    /// one: each watcher is re-evaluated right before its callback, and the
    /// outer flush makes another pass until nothing moved underneath it.
    pub fn flush(&self) -> usize {
        {
            let mut state = self.state.borrow_mut();
            if state.flushing {
                state.dirty = true;
                return 0;
            }
            state.flushing = true;
        }

        let mut delivered = 0;
        for _ in 0..MAX_FLUSH_PASSES {
            self.state.borrow_mut().dirty = false;
            delivered += self.flush_pass();
            if !self.state.borrow().dirty {
                break;
            }
        }

        let mut state = self.state.borrow_mut();
        if state.dirty {
            tracing::warn!("viewport still changing after {MAX_FLUSH_PASSES} passes");
            state.dirty = false;
        }
        state.flushing = false;
        delivered
    }

    fn flush_pass(&self) -> usize {
        let ids: Vec<u64> = self.state.borrow().observers.keys().copied().collect();

        let mut delivered = 0;
        for id in ids {
            let pending = {
                let mut state = self.state.borrow_mut();
                let Some((target, options)) = state.observers.get(&id).map(|o| (o.target, o.options))
                else {
                    continue;
                };
                let Some(entry) = state.entry_for(target, options.root_margin) else {
                    continue;
                };
                let met = entry.meets(options.threshold);
                let due = state.observers.get_mut(&id).and_then(|observer| {
                    if observer.last_met == Some(met) {
                        return None;
                    }
                    observer.last_met = Some(met);
                    observer.callback.take().map(|callback| (callback, entry))
                });
                due
            };

            let Some((mut callback, entry)) = pending else {
                continue;
            };
            callback(entry);
            delivered += 1;

            // Put it back unless the callback unobserved itself
            if let Some(observer) = self.state.borrow_mut().observers.get_mut(&id) {
                observer.callback = Some(callback);
            }
        }
        delivered
    }
}

impl IntersectionSource for Viewport {
    fn observe(
        &self,
        target: ElementId,
        options: ObserverOptions,
        callback: IntersectionCallback,
    ) -> ObserverId {
        let mut state = self.state.borrow_mut();
        let id = state.next_observer;
        state.next_observer += 1;
        state.observers.insert(
            id,
            Observer {
                target,
                options,
                callback: Some(callback),
                last_met: None,
            },
        );
        ObserverId(id)
    }

    fn unobserve(&self, id: ObserverId) -> bool {
        self.state.borrow_mut().observers.remove(&id.0).is_some()
    }
}

// =============================================================================
// TESTS
// =============================================================================
