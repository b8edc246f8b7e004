//! One-step update rules
//!
//! Each step, every junction holding cars picks one neighbor at random and
//! tries to push a random batch of cars there. The batch is accepted only if
//! the neighbor has room for all of it; otherwise the cars stay put.
//!
//! The two rules differ in what a junction sees while deciding:
//! - `Sequential` sweeps junctions in enumeration order and applies each move
//!   immediately, so later junctions already see earlier inflow.
//! - `Synchronous` decides every move against start-of-step occupancy and
//!   applies all accepted moves together once the sweep is over.

use log::trace;
use rand::seq::IndexedRandom;
use rand::Rng;

use super::config::Dynamics;
use super::network::SimNetwork;
use super::types::{JunctionId, StreetId};

impl Dynamics {
    /// Advance the network by one step and return the occupancy snapshot the
    /// rule records for this step
    pub fn step<R: Rng + ?Sized>(
        self,
        network: &mut SimNetwork,
        transport_capacity: u32,
        rng: &mut R,
    ) -> Vec<u32> {
        match self {
            Dynamics::Sequential => step_sequential(network, transport_capacity, rng),
            Dynamics::Synchronous => step_synchronous(network, transport_capacity, rng),
        }
    }
}

/// Batch size a junction holding `cars` tries to move: uniform over
/// `0..=min(cars, transport_capacity)`
pub fn sample_batch<R: Rng + ?Sized>(cars: u32, transport_capacity: u32, rng: &mut R) -> u32 {
    rng.random_range(0..=cars.min(transport_capacity))
}

/// Sequential sweep in enumeration order.
///
/// The snapshot holds each junction's occupancy at the moment it is visited:
/// it may include inflow from junctions visited earlier in this step, but
/// never the junction's own outflow.
pub fn step_sequential<R: Rng + ?Sized>(
    network: &mut SimNetwork,
    transport_capacity: u32,
    rng: &mut R,
) -> Vec<u32> {
    let mut snapshot = Vec::with_capacity(network.junction_count());

    for index in 0..network.junction_count() {
        let id = JunctionId::new(index);
        let cars = network.junction_ref(id).occupancy;
        snapshot.push(cars);

        if cars == 0 {
            continue;
        }
        let Some(&(next, street)) = network.neighbors(id).choose(rng) else {
            trace!("Junction {} has {} cars but no neighbors", id, cars);
            continue;
        };

        let moved = sample_batch(cars, transport_capacity, rng);
        if moved <= network.junction_ref(next).headroom() {
            network.junction_mut(id).occupancy -= moved;
            network.junction_mut(next).occupancy += moved;
            network.add_flux(street, u64::from(moved));
            trace!("{} -> {}: moved {}", id, next, moved);
        } else {
            trace!("{} -> {}: blocked batch of {}", id, next, moved);
        }
    }

    snapshot
}

/// Barrier-synchronized step.
///
/// Decisions read start-of-step occupancy only. Senders targeting the same
/// junction are admitted greedily in scan order against the headroom left by
/// the moves already accepted this step. The snapshot is the start-of-step
/// occupancy of every junction.
pub fn step_synchronous<R: Rng + ?Sized>(
    network: &mut SimNetwork,
    transport_capacity: u32,
    rng: &mut R,
) -> Vec<u32> {
    let snapshot = network.occupancies();
    let mut pending = vec![0i64; network.junction_count()];
    let mut flux = vec![0u64; network.street_count()];

    for (index, &cars) in snapshot.iter().enumerate() {
        if cars == 0 {
            continue;
        }
        let id = JunctionId::new(index);
        let Some(&(next, street)) = network.neighbors(id).choose(rng) else {
            trace!("Junction {} has {} cars but no neighbors", id, cars);
            continue;
        };

        let moved = sample_batch(cars, transport_capacity, rng);
        let capacity = i64::from(network.junction_ref(next).capacity);
        let projected = i64::from(snapshot[next.index()]) + pending[next.index()];
        if projected + i64::from(moved) <= capacity {
            pending[index] -= i64::from(moved);
            pending[next.index()] += i64::from(moved);
            flux[street.index()] += u64::from(moved);
            trace!("{} -> {}: proposed {}", id, next, moved);
        } else {
            trace!("{} -> {}: blocked batch of {}", id, next, moved);
        }
    }

    for (index, delta) in pending.into_iter().enumerate() {
        if delta != 0 {
            let junction = network.junction_mut(JunctionId::new(index));
            junction.occupancy = (i64::from(junction.occupancy) + delta) as u32;
        }
    }
    for (index, cars) in flux.into_iter().enumerate() {
        if cars != 0 {
            network.add_flux(StreetId::new(index), cars);
        }
    }

    snapshot
}
