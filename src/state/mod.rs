//! State Module - Presentation behaviours
//!
//! Per-instance state machines driven by the engine's timer and
//! intersection sources:
//!
//! - **Reveal** - One-shot, delayed, directional enter transition on scroll
//! - **Typewriter** - Looping type/hold/delete over a list of phrases
//! - **Transition** - Easing and sampling between two reveal styles

mod reveal;
mod transition;
mod typewriter;

pub use reveal::*;
pub use transition::*;
pub use typewriter::*;
