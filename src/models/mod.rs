//! Resource-allocation domain models.
//!
//! Inputs ([`Task`], [`Resource`], [`ConstraintSet`], [`Preferences`],
//! [`OptimizationRequest`]) are immutable for the duration of a run.
//! Outputs ([`OptimizationResult`] and its parts) are plain serializable data.
//!
//! # Domain Mappings
//!
//! | u-allocate | Construction | Field service | Manufacturing |
//! |------------|--------------|---------------|---------------|
//! | Task | Work package | Work order | Operation |
//! | Resource | Crew / machine | Technician / van | Machine / operator |
//! | SchedulingPlan | Site schedule | Dispatch plan | Production plan |

mod calendar;
mod constraint;
mod plan;
mod request;
mod resource;
mod result;
mod task;

pub use calendar::{Calendar, TimeWindow, MS_PER_DAY, MS_PER_HOUR};
pub use constraint::{ConstraintSet, ObjectiveWeights, Preferences, SafetyRule};
pub use plan::{Milestone, SchedulingPlan, TaskTiming, UtilizationSample};
pub use request::{Goal, OptimizationRequest, RequestId, ResourceFilter};
pub use resource::{Resource, ResourceType, Skill};
pub use result::{
    Allocation, Bottleneck, GenerationStats, OptimizationResult, PerformanceMetrics,
    Recommendation, RecommendationKind, RecommendationStatus, Scenario, Severity, Warning,
    WarningKind,
};
pub use task::Task;
