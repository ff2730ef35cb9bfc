use std::time::Instant;

use basket_core::{MiningError, Resource, ResourceLimits, Result};

/// Call-scoped resource budget.
///
/// Candidate and node ceilings are checked per level / per tree, so whether a
/// call trips them does not depend on how rayon schedules work. Only the
/// deadline is timing-dependent.
#[derive(Debug, Clone)]
pub struct Budget {
    limits: ResourceLimits,
    started: Instant,
}

impl Budget {
    pub fn new(limits: &ResourceLimits) -> Self {
        Self {
            limits: limits.clone(),
            started: Instant::now(),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(&ResourceLimits::default())
    }

    pub fn check_candidates(&self, generated: usize) -> Result<()> {
        check(Resource::Candidates, self.limits.max_candidates, generated as u64)
    }

    pub fn check_tree_nodes(&self, allocated: usize) -> Result<()> {
        check(Resource::TreeNodes, self.limits.max_tree_nodes, allocated as u64)
    }

    pub fn check_deadline(&self) -> Result<()> {
        let elapsed = self.started.elapsed().as_millis() as u64;
        check(Resource::TimeMillis, self.limits.time_limit_ms, elapsed)
    }
}

fn check(resource: Resource, limit: Option<u64>, observed: u64) -> Result<()> {
    match limit {
        Some(limit) if observed > limit => Err(MiningError::ResourceExhausted {
            resource,
            limit,
            observed,
        }),
        _ => Ok(()),
    }
}
