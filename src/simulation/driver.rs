//! Runs a full simulation: reset, inject, step, record
//!
//! `TrafficSimulation` owns the network for the duration of a run. Callers
//! supply the RNG so runs can be reproduced from a seed.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::{validate_run, Dynamics, SimConfig};
use super::error::SimResult;
use super::history::PopulationHistory;
use super::injector::inject_load;
use super::network::SimNetwork;

/// A capacity-constrained traffic simulation over one network
#[derive(Debug, Clone)]
pub struct TrafficSimulation {
    network: SimNetwork,
    /// Upper bound on the batch a junction may try to move in one step
    transport_capacity: u32,
}

impl TrafficSimulation {
    pub fn new(network: SimNetwork, transport_capacity: u32) -> Self {
        Self {
            network,
            transport_capacity,
        }
    }

    pub fn network(&self) -> &SimNetwork {
        &self.network
    }

    pub fn transport_capacity(&self) -> u32 {
        self.transport_capacity
    }

    pub fn into_network(self) -> SimNetwork {
        self.network
    }

    /// Zero all occupancy and flux so a new run can start
    pub fn reset(&mut self) {
        self.network.reset();
    }

    /// Place `floor(load * junctions)` cars on the network
    pub fn inject<R: Rng + ?Sized>(&mut self, load: f64, rng: &mut R) -> SimResult<u64> {
        inject_load(&mut self.network, load, rng)
    }

    /// Advance one step with the given rule, returning the recorded snapshot
    pub fn step<R: Rng + ?Sized>(&mut self, dynamics: Dynamics, rng: &mut R) -> Vec<u32> {
        dynamics.step(&mut self.network, self.transport_capacity, rng)
    }

    /// Run `steps` steps from a fresh injection of `load`.
    ///
    /// Parameters are checked before the network is touched. If injection
    /// fails the run stops before any step is taken.
    pub fn simulate<R: Rng + ?Sized>(
        &mut self,
        steps: usize,
        load: f64,
        dynamics: Dynamics,
        rng: &mut R,
    ) -> SimResult<PopulationHistory> {
        validate_run(steps, load)?;

        self.reset();
        let injected = self.inject(load, rng)?;

        info!(
            "Simulating {} steps with {} dynamics ({} cars, tc={})",
            steps, dynamics, injected, self.transport_capacity
        );

        let mut history = PopulationHistory::with_capacity(self.network.junction_count(), steps);
        for step in 0..steps {
            let snapshot = self.step(dynamics, rng);
            history.push_row(&snapshot);
            debug!(
                "Step {}: {} cars, total flux {}",
                step + 1,
                self.network.total_occupancy(),
                self.network.total_flux()
            );
        }

        info!("Simulation complete after {} steps", steps);
        Ok(history)
    }
}

/// Build the run's RNG. Without a seed one is drawn from the OS; the seed
/// actually used is returned so the run can be repeated.
pub fn seeded_rng(seed: Option<u64>) -> (StdRng, u64) {
    let seed = seed.unwrap_or_else(|| rand::rng().random());
    (StdRng::seed_from_u64(seed), seed)
}

/// Run a whole simulation described by `config` on `network`, returning the
/// final network together with the occupancy history.
///
/// Every junction is given `config.capacity` before the run starts.
pub fn simulate(
    mut network: SimNetwork,
    config: &SimConfig,
) -> SimResult<(SimNetwork, PopulationHistory)> {
    config.validate()?;
    network.reset();
    network.set_capacity(config.capacity)?;

    let (mut rng, seed) = seeded_rng(config.seed);
    info!("Using seed {}", seed);

    let mut simulation = TrafficSimulation::new(network, config.transport_capacity);
    let history = simulation.simulate(config.steps, config.load, config.dynamics, &mut rng)?;
    Ok((simulation.into_network(), history))
}
