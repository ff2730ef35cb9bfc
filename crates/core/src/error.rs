use thiserror::Error;

/// Ceiling that a mining call may run into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Candidates generated for a single Apriori level.
    Candidates,
    /// Nodes allocated in a single FP-tree arena.
    TreeNodes,
    /// Wall-clock milliseconds since the call started.
    TimeMillis,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resource::Candidates => write!(f, "candidates"),
            Resource::TreeNodes => write!(f, "tree nodes"),
            Resource::TimeMillis => write!(f, "time (ms)"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MiningError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Resource exhausted: {resource} limit {limit} exceeded (observed {observed})")]
    ResourceExhausted {
        resource: Resource,
        limit: u64,
        observed: u64,
    },

    #[error("Internal invariant violated: {0}")]
    InternalInvariantViolation(String),
}

impl MiningError {
    /// True for errors caused by a caller-supplied budget rather than bad input or a bug.
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, MiningError::ResourceExhausted { .. })
    }
}

pub type Result<T> = std::result::Result<T, MiningError>;

/// Reject a threshold outside `(0, 1]`.
pub fn check_unit_threshold(name: &str, value: f64) -> Result<()> {
    if value.is_nan() || value <= 0.0 || value > 1.0 {
        return Err(MiningError::InvalidParameter(format!(
            "{name} must be in (0, 1], got {value}"
        )));
    }
    Ok(())
}
