//! Core types for folio-motion.
//!
//! These types are shared by the environment layer (viewport, timers) and the
//! behaviour controllers. They are what a render layer ultimately consumes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::MotionError;

// =============================================================================
// Geometry
// =============================================================================

/// Translation applied to an element, in pixels.
///
/// Positive `dx` moves right, positive `dy` moves down.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub dx: f32,
    pub dy: f32,
}

impl Offset {
    /// No translation.
    pub const ZERO: Self = Self { dx: 0.0, dy: 0.0 };

    pub const fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}

/// Axis-aligned rectangle in document coordinates (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Grow the rectangle by `margin` on every side (negative shrinks).
    pub fn expand(&self, margin: f32) -> Self {
        Self {
            x: self.x - margin,
            y: self.y - margin,
            width: (self.width + margin * 2.0).max(0.0),
            height: (self.height + margin * 2.0).max(0.0),
        }
    }

    /// Overlap of two rectangles.
    ///
    /// Returns `None` when they are disjoint. Rectangles that only share an
    /// edge produce a zero-area overlap, which still counts as touching.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right < left || bottom < top {
            return None;
        }

        Some(Rect::new(left, top, right - left, bottom - top))
    }
}

/// Identifier of an element registered with a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u32);

// =============================================================================
// Reveal Direction
// =============================================================================

/// Direction an element slides in from when revealed.
///
/// Deserializes leniently, like [`Direction::from_name_or_default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Left,
    Right,
    Up,
    Down,
    /// Opacity only, no translation.
    Fade,
}

impl Direction {
    pub const ALL: [Direction; 5] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
        Direction::Fade,
    ];

    /// Offset the element rests at before it is revealed.
    pub const fn initial_offset(self) -> Offset {
        match self {
            Direction::Left => Offset::new(-100.0, 0.0),
            Direction::Right => Offset::new(100.0, 0.0),
            Direction::Up => Offset::new(0.0, -50.0),
            Direction::Down => Offset::new(0.0, 50.0),
            Direction::Fade => Offset::ZERO,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Fade => "fade",
        }
    }

    /// Parse a direction name, falling back to [`Direction::Left`] for
    /// anything unrecognised.
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|err: MotionError| {
            tracing::warn!(error = %err, "using default direction");
            Self::default()
        })
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Direction::from_name_or_default(&name))
    }
}

impl FromStr for Direction {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Direction::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| MotionError::UnknownDirection(name.to_string()))
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Reveal State
// =============================================================================

/// Lifecycle of a reveal instance. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RevealState {
    /// Waiting for the element to enter the viewport.
    #[default]
    Pending,
    /// Entered the viewport, waiting out the delay.
    Armed,
    /// Transition started. Permanent.
    Revealed,
}

impl RevealState {
    #[inline]
    pub fn is_revealed(self) -> bool {
        self == RevealState::Revealed
    }

    /// Target presentation for this state.
    pub fn style(self, direction: Direction, duration_secs: f32) -> RevealStyle {
        match self {
            RevealState::Revealed => RevealStyle {
                opacity: 1.0,
                offset: Offset::ZERO,
                duration_secs,
            },
            RevealState::Pending | RevealState::Armed => RevealStyle {
                opacity: 0.0,
                offset: direction.initial_offset(),
                duration_secs,
            },
        }
    }
}

/// Discrete target values the render layer transitions towards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealStyle {
    /// 0 while hidden, 1 once revealed.
    pub opacity: f32,
    pub offset: Offset,
    /// Length of the eased transition into this style.
    pub duration_secs: f32,
}
