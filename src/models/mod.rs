//! Data models for the SchoolHub banner service.
//!
//! Field names serialize in camelCase to match the admin dashboard's records.

mod banner;
mod color;
mod media;
mod revision;

pub use banner::*;
pub use color::*;
pub use media::*;
pub use revision::*;
