//! Runtime side of the command engine: dispatch loop, profiling and the
//! resource counters the profiler reads.
//!
//! Dispatcher::execute -> validate -> Profiler::run(handler)
//! Sampler (background thread) -> SharedUsage <- Profiler (read-only)

pub mod dispatch;
pub mod profiler;
pub mod usage;

pub use dispatch::{CallContext, Dispatch, Dispatcher, Handler, Registry, Settings};
pub use usage::{Sampler, SharedUsage};
