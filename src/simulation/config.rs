//! Simulation parameters
//!
//! Defaults follow the values the headless CLI has always shipped with.

use clap::ValueEnum;
use std::fmt;

use super::error::{SimError, SimResult};

/// Default maximum number of cars a junction can hold
pub const DEFAULT_CAPACITY: u32 = 10;
/// Default transport capacity (cars a junction may try to move per step)
pub const DEFAULT_TRANSPORT_CAPACITY: u32 = 3;
/// Default number of simulated steps
pub const DEFAULT_STEPS: usize = 100;
/// Default average number of cars per junction
pub const DEFAULT_LOAD: f64 = 3.0;

/// Which one-step update rule drives the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Dynamics {
    /// Single fixed-order sweep; moves are visible to junctions visited later
    #[default]
    #[value(aliases = ["asy", "async"])]
    Sequential,
    /// Every decision reads start-of-step state; moves are applied as a batch
    #[value(aliases = ["sy", "sync"])]
    Synchronous,
}

impl fmt::Display for Dynamics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dynamics::Sequential => write!(f, "sequential"),
            Dynamics::Synchronous => write!(f, "synchronous"),
        }
    }
}

/// Parameters for one simulation run
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Capacity given to every junction when the network is built
    pub capacity: u32,
    pub transport_capacity: u32,
    pub steps: usize,
    pub load: f64,
    pub dynamics: Dynamics,
    /// Seed for the run's RNG; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            transport_capacity: DEFAULT_TRANSPORT_CAPACITY,
            steps: DEFAULT_STEPS,
            load: DEFAULT_LOAD,
            dynamics: Dynamics::default(),
            seed: None,
        }
    }
}

impl SimConfig {
    /// Reject parameters no run can use
    pub fn validate(&self) -> SimResult<()> {
        if self.capacity == 0 {
            return Err(SimError::InvalidConfiguration(
                "junction capacity must be positive".into(),
            ));
        }
        validate_run(self.steps, self.load)
    }
}

/// Checks shared by every entry point that starts a run
pub(crate) fn validate_run(steps: usize, load: f64) -> SimResult<()> {
    if steps == 0 {
        return Err(SimError::InvalidConfiguration(
            "number of steps must be positive".into(),
        ));
    }
    if !load.is_finite() || load < 0.0 {
        return Err(SimError::InvalidConfiguration(format!(
            "load must be a finite non-negative number, got {}",
            load
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let zero_capacity = SimConfig {
            capacity: 0,
            ..SimConfig::default()
        };
        let zero_steps = SimConfig {
            steps: 0,
            ..SimConfig::default()
        };
        let negative_load = SimConfig {
            load: -0.5,
            ..SimConfig::default()
        };
        let nan_load = SimConfig {
            load: f64::NAN,
            ..SimConfig::default()
        };

        for config in [zero_capacity, zero_steps, negative_load, nan_load] {
            assert!(matches!(
                config.validate(),
                Err(SimError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_dynamics_short_names() {
        assert_eq!(
            Dynamics::from_str("asy", true).unwrap(),
            Dynamics::Sequential
        );
        assert_eq!(
            Dynamics::from_str("sy", true).unwrap(),
            Dynamics::Synchronous
        );
        assert_eq!(
            Dynamics::from_str("synchronous", true).unwrap(),
            Dynamics::Synchronous
        );
    }
}
