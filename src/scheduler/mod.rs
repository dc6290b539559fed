//! Placement, plan building and KPI evaluation.
//!
//! # Algorithm
//!
//! [`network::forward_pass`] places allocations in dependency order on
//! capacity-limited resources (serial schedule generation). The
//! [`ScheduleBuilder`] then runs the backward pass, derives slack and the
//! critical path, and buckets resource utilization.
//!
//! # KPI
//!
//! [`kpi::calculate`] compares the chosen plan against a naive baseline:
//! cost and time savings, utilization and confidence.
//!
//! # References
//!
//! - Kelley & Walker (1959), "Critical-Path Planning and Scheduling"
//! - Kolisch (1996), "Serial and parallel resource-constrained project
//!   scheduling methods revisited"

mod builder;
pub mod kpi;
pub mod network;

pub use builder::{buckets, peak_load, ScheduleBuilder};
pub use kpi::RunStatusFlags;
pub use network::{forward_pass, ResourceTimeline};
