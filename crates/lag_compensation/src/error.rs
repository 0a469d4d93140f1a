//! Error types for history queries, shape authoring and rewind orchestration

use crate::config::ConfigError;
use crate::physics::collection::RewindState;

/// Failures of a single history buffer
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum HistoryError {
    /// No recorded sample is at or before the query time
    #[error("history underflow: no sample at or before t={query_time} (oldest: {oldest:?})")]
    Underflow {
        /// Requested time
        query_time: f64,
        /// Oldest recorded time, `None` for an empty buffer
        oldest: Option<f64>,
    },

    /// A frame was recorded at or before the newest stored time
    #[error("non-monotonic frame time {time} (newest recorded is {latest})")]
    NonMonotonicTime {
        /// Rejected frame time
        time: f64,
        /// Newest time already in the buffer
        latest: f64,
    },
}

/// Main error type for the lag compensation core
#[derive(thiserror::Error, Debug)]
pub enum LagCompensationError {
    /// History lookup or recording failure
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Shape dimension rejected at authoring time
    #[error("invalid shape parameter `{name}`: {value}")]
    InvalidShapeParameter {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f32,
    },

    /// Invalid mesh topology
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// Ray direction is zero length or not finite
    #[error("degenerate ray direction")]
    DegenerateRay,

    /// Rewind state machine transition that is not allowed
    #[error("illegal rewind transition: cannot {action} while {state:?}")]
    IllegalTransition {
        /// Attempted operation
        action: &'static str,
        /// State the collection was in
        state: RewindState,
    },

    /// Collection bounding sphere does not contain all children
    #[error("bounding radius {radius} is smaller than the required {required}")]
    BoundingSphereUndersized {
        /// Authored radius
        radius: f32,
        /// Smallest radius containing every child
        required: f32,
    },

    /// Handle does not refer to a registered collection
    #[error("unknown collection handle")]
    UnknownCollection,

    /// A rewind cycle is already in progress
    #[error("a rewind is already active; call simulate_reset first")]
    RewindActive,

    /// Configuration failure
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for lag compensation operations
pub type LagResult<T> = Result<T, LagCompensationError>;
