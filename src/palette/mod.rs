//! Palette extraction from video frames and the client-side palette cache.
//!
//! Palettes are cosmetic: they tint the slide overlay for legibility. Every
//! failure in this module is logged and swallowed.

mod cache;
mod extract;
mod frame;
mod sink;

pub use cache::*;
pub use extract::*;
pub use frame::*;
pub use sink::*;
