//! Request orchestration.
//!
//! [`OptimizationEngine`] loads inputs through the collaborators, runs the
//! [`optimize`] pipeline off the async runtime, persists the result and
//! tracks every request it has seen.

mod engine;
mod pipeline;
mod retry;

pub use engine::{EngineBuilder, OptimizationEngine, RunStatus};
pub use pipeline::optimize;
pub use retry::RetryPolicy;
