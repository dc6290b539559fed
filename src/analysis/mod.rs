//! Post-optimization analysis.
//!
//! Everything here reads a finished allocation and derives reports from it;
//! nothing re-runs the search.
//!
//! - [`risk`]: budget, deadline, capacity, certification and availability warnings
//! - [`bottleneck`]: per resource type per period capacity shortfalls
//! - [`scenario`]: labeled cost/time trade-offs of the baseline plan
//! - [`recommend`]: ranked task-to-resource recommendations

pub mod bottleneck;
pub mod recommend;
pub mod risk;
pub mod scenario;

pub use bottleneck::find_bottlenecks;
pub use recommend::{recommend, recommendation_id, request_of};
pub use risk::assess;
pub use scenario::generate as generate_scenarios;
