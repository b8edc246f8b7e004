//! Standalone traffic flow simulation module
//!
//! Junctions hold a bounded number of cars; every step cars are pushed along
//! streets to neighboring junctions, subject to the receiver having room.
//! The module has no I/O: it takes a built network and parameters and hands
//! back the final network plus the occupancy history.

mod config;
mod driver;
mod dynamics;
mod error;
mod history;
mod injector;
mod network;
mod types;

pub use config::{
    Dynamics, SimConfig, DEFAULT_CAPACITY, DEFAULT_LOAD, DEFAULT_STEPS,
    DEFAULT_TRANSPORT_CAPACITY,
};
pub use driver::{seeded_rng, simulate, TrafficSimulation};
pub use dynamics::{sample_batch, step_sequential, step_synchronous};
pub use error::{SimError, SimResult};
pub use history::PopulationHistory;
pub use injector::{inject_load, target_cars};
pub use network::{NetworkBuilder, SimNetwork};
pub use types::{Junction, JunctionId, Position, Street, StreetId};
