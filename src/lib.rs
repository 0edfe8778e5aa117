//! # folio-motion
//!
//! Scroll-reveal and typewriter animation controllers for reactive UIs.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals): every
//! controller publishes its presentation state through a `Signal`, so a render
//! layer can bind to it with an effect or simply poll it each frame.
//!
//! ## Architecture
//!
//! Controllers are single-threaded state machines. They never sleep or poll;
//! they react to two environment capabilities:
//! ```text
//! TimerSource ─────────┐
//!                      ├──▶ RevealController / CyclingTypewriter ──▶ Signal ──▶ render
//! IntersectionSource ──┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Shared types (Direction, Offset, Rect, RevealState, RevealStyle)
//! - [`engine`] - Timer queue and scrollable viewport (the environment)
//! - [`state`] - Reveal controller, typewriter, transition sampling
//! - [`config`] - Animation constants and defaults, loadable from TOML
//! - [`content`] - Remote content layered over required defaults
//! - [`error`] - Errors from config and content loading

pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::{MotionConfig, RevealSettings, TypewriterSettings};

pub use content::{resolve, HeroContent, HeroOverrides, Layered, SocialLinks};

pub use engine::{
    IntersectionEntry, IntersectionSource, ObserverId, ObserverOptions, TimerId, TimerQueue,
    TimerSource, Viewport,
};

pub use error::{MotionError, Result};

pub use state::{
    // Reveal
    RevealConfig, RevealController, RevealHandle,
    // Typewriter
    CyclingTypewriter, Typewriter, TypewriterHandle, TypewriterPhase, TypewriterTiming,
    // Transition
    Easing, Transition,
};
