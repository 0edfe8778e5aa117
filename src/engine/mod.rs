//! Engine - The environment the behaviour controllers run in.
//!
//! Controllers consume two capabilities and nothing else:
//! - [`TimerSource`]: schedule a callback after N ms, cancel it
//! - [`IntersectionSource`]: report when an element crosses a visibility threshold
//!
//! Both ship with a single-threaded implementation ([`TimerQueue`],
//! [`Viewport`]). Hosts with their own event sources implement the traits.
//!
//! # Architecture
//!
//! ```text
//! host loop ──advance/poll──▶ TimerQueue ──callback──▶ controller
//! host loop ──scroll/flush──▶ Viewport   ──callback──▶ controller
//! ```
//!
//! Callbacks always run outside any internal borrow, so a controller may
//! schedule, cancel or unobserve from inside its own callback.

mod timers;
mod viewport;

pub use timers::*;
pub use viewport::*;
