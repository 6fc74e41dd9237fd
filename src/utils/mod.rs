//! Utility helpers: generational allocation and logging.

pub mod allocator;
pub mod logging;

pub use allocator::{Arena, Handle};
pub use logging::ScopedTimer;
