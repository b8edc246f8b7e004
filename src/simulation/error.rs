//! Error taxonomy for the simulation core.
//!
//! Every fallible core operation returns `SimResult<T>`. Errors are raised
//! before any simulation state is touched, so a failed call leaves the
//! network exactly as it was.

use super::types::JunctionId;

#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// The requested load needs more room than the network has left.
    CapacityExceeded { requested: u64, available: u64 },

    /// A parameter is out of range (zero capacity, zero steps, bad load).
    InvalidConfiguration(String),

    /// The graph is not simple (self loop or parallel street).
    InvalidTopology(String),

    /// A junction id does not belong to this network.
    UnknownJunction(JunctionId),
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::CapacityExceeded {
                requested,
                available,
            } => write!(
                f,
                "capacity exceeded: requested {} cars but only {} slots are free",
                requested, available
            ),
            SimError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {}", msg),
            SimError::InvalidTopology(msg) => write!(f, "invalid topology: {}", msg),
            SimError::UnknownJunction(id) => write!(f, "junction {} not found", id),
        }
    }
}

impl std::error::Error for SimError {}

/// Convenience alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;
