//! Transition sampling for render layers.
//!
//! Controllers only emit discrete target styles. A host that draws frames
//! itself (no CSS transitions) samples a [`Transition`] between the previous
//! and the new style.

use std::time::Duration;

use crate::types::{Offset, RevealStyle};

/// Easing curve mapping linear progress [0, 1] to eased progress [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    /// Cubic ease-out, close to CSS `ease-out`.
    #[default]
    EaseOut,
    /// Cubic ease-in-out.
    EaseInOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOut => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
            Easing::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let inv = -2.0 * t + 2.0;
                    1.0 - inv * inv * inv / 2.0
                }
            }
        }
    }
}

#[inline]
fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Interpolation from one style to another over `to.duration_secs`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: RevealStyle,
    pub to: RevealStyle,
    pub easing: Easing,
}

impl Transition {
    pub fn between(from: RevealStyle, to: RevealStyle) -> Self {
        Self {
            from,
            to,
            easing: Easing::default(),
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Transition length. Negative, NaN or out-of-range seconds count as zero.
    pub fn duration(&self) -> Duration {
        Duration::try_from_secs_f32(self.to.duration_secs).unwrap_or_default()
    }

    /// Linear progress in [0, 1]. Zero duration is complete immediately.
    pub fn progress(&self, elapsed: Duration) -> f32 {
        let duration = self.duration();
        if duration.is_zero() {
            return 1.0;
        }
        (elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self, elapsed: Duration) -> bool {
        self.progress(elapsed) >= 1.0
    }

    /// Opacity and offset `elapsed` into the transition.
    pub fn sample(&self, elapsed: Duration) -> (f32, Offset) {
        let t = self.easing.apply(self.progress(elapsed));
        let opacity = lerp(self.from.opacity, self.to.opacity, t);
        let offset = Offset::new(
            lerp(self.from.offset.dx, self.to.offset.dx, t),
            lerp(self.from.offset.dy, self.to.offset.dy, t),
        );
        (opacity, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, RevealState};

    fn reveal_transition() -> Transition {
        let from = RevealState::Pending.style(Direction::Left, 0.8);
        let to = RevealState::Revealed.style(Direction::Left, 0.8);
        Transition::between(from, to)
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::EaseOut, Easing::EaseInOut] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6);
            assert_eq!(easing.apply(-3.0), 0.0);
        }
    }

    #[test]
    fn test_ease_out_front_loaded() {
        assert!(Easing::EaseOut.apply(0.5) > 0.5);
        assert!((Easing::EaseInOut.apply(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sample_start_and_end() {
        let transition = reveal_transition();

        let (opacity, offset) = transition.sample(Duration::ZERO);
        assert_eq!(opacity, 0.0);
        assert_eq!(offset, Offset::new(-100.0, 0.0));

        let (opacity, offset) = transition.sample(Duration::from_millis(900));
        assert_eq!(opacity, 1.0);
        assert!(offset.dx.abs() < 1e-4);
        assert!(transition.is_complete(Duration::from_millis(900)));
        assert!(!transition.is_complete(Duration::from_millis(400)));
    }

    #[test]
    fn test_linear_midpoint() {
        let transition = reveal_transition().with_easing(Easing::Linear);
        let (opacity, offset) = transition.sample(Duration::from_millis(400));
        assert!((opacity - 0.5).abs() < 1e-4);
        assert!((offset.dx + 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_zero_duration_jumps() {
        let from = RevealState::Pending.style(Direction::Up, 0.0);
        let to = RevealState::Revealed.style(Direction::Up, 0.0);
        let transition = Transition::between(from, to);

        assert!(transition.is_complete(Duration::ZERO));
        assert_eq!(transition.sample(Duration::ZERO).0, 1.0);
    }

    #[test]
    fn test_unrepresentable_duration_jumps() {
        for secs in [f32::INFINITY, f32::NAN, -2.0] {
            let mut to = RevealState::Revealed.style(Direction::Down, 0.8);
            to.duration_secs = secs;
            let transition = Transition::between(RevealState::Pending.style(Direction::Down, 0.8), to);

            assert_eq!(transition.duration(), Duration::ZERO);
            assert_eq!(transition.sample(Duration::from_millis(10)).0, 1.0);
        }
    }
}
