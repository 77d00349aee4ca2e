//! Kestrel Core
//!
//! Shared building blocks for the Kestrel widget toolkit: generational
//! storage, logging and profiling bootstrap, and math re-exports.

pub mod alloc;
pub mod config;
pub mod logging;
pub mod math;
pub mod profiling;
