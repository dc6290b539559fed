//! Ranked recommendations.

use crate::models::{
    Allocation, Recommendation, RecommendationKind, RecommendationStatus, RequestId,
    SchedulingPlan,
};

/// One recommendation per assigned allocation.
///
/// Ranked critical-path tasks first, then by expected cost (highest first),
/// then by task ID. IDs are `<request id>-rec-<rank>`.
pub fn recommend(
    request_id: &RequestId,
    allocations: &[Allocation],
    plan: &SchedulingPlan,
) -> Vec<Recommendation> {
    let mut assigned: Vec<(&Allocation, &str, bool)> = allocations
        .iter()
        .filter_map(|a| {
            a.resource_id
                .as_deref()
                .map(|r| (a, r, plan.is_critical(&a.task_id)))
        })
        .collect();
    assigned.sort_by(|(a, _, ca), (b, _, cb)| {
        cb.cmp(ca)
            .then_with(|| b.cost.total_cmp(&a.cost))
            .then_with(|| a.task_id.cmp(&b.task_id))
    });

    assigned
        .into_iter()
        .enumerate()
        .map(|(i, (a, resource_id, critical))| {
            let rank = i + 1;
            let mut rationale = format!(
                "Assign {} to {}: {:.0}% predicted success at {:.2}",
                resource_id,
                a.task_id,
                a.success_probability * 100.0,
                a.cost
            );
            if a.fraction < 1.0 {
                rationale.push_str(&format!(", {:.0}% capacity", a.fraction * 100.0));
            }
            if critical {
                rationale.push_str("; on the critical path");
            }
            Recommendation {
                id: recommendation_id(request_id, rank),
                rank,
                kind: RecommendationKind::AssignResource,
                task_id: a.task_id.clone(),
                resource_id: resource_id.to_string(),
                rationale,
                confidence: a.success_probability,
                expected_cost: a.cost,
                status: RecommendationStatus::Pending,
            }
        })
        .collect()
}

/// Recommendation ID for a rank.
pub fn recommendation_id(request_id: &RequestId, rank: usize) -> String {
    format!("{request_id}-rec-{rank}")
}

/// Request ID embedded in a recommendation ID.
pub fn request_of(recommendation_id: &str) -> Option<RequestId> {
    let (request, rank) = recommendation_id.rsplit_once("-rec-")?;
    rank.parse::<usize>().ok()?;
    Some(RequestId::new(request))
}
