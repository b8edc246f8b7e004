//! Initial car placement
//!
//! Cars are dropped one at a time on a uniformly chosen junction that still
//! has room. Junctions that fill up early stop receiving cars, so small
//! junctions end up with less than their raw share.

use log::{debug, info};
use rand::Rng;

use super::error::{SimError, SimResult};
use super::network::SimNetwork;
use super::types::JunctionId;

/// Number of cars a given load asks for: `floor(load * junctions)`
pub fn target_cars(load: f64, junction_count: usize) -> u64 {
    (load * junction_count as f64).floor() as u64
}

/// Inject `floor(load * junctions)` cars into the network.
///
/// Fails with `CapacityExceeded` before placing anything if the network
/// doesn't have enough free slots. Returns the number of cars placed.
pub fn inject_load<R: Rng + ?Sized>(
    network: &mut SimNetwork,
    load: f64,
    rng: &mut R,
) -> SimResult<u64> {
    if !load.is_finite() || load < 0.0 {
        return Err(SimError::InvalidConfiguration(format!(
            "load must be a finite non-negative number, got {}",
            load
        )));
    }

    let target = target_cars(load, network.junction_count());
    let available = network.total_headroom();
    if target > available {
        return Err(SimError::CapacityExceeded {
            requested: target,
            available,
        });
    }

    info!(
        "Setting {} cars on {} junctions (load {})",
        target,
        network.junction_count(),
        load
    );

    // Picking uniformly among junctions with room is the same distribution
    // as redrawing over all junctions until one has room, but always ends.
    let mut open: Vec<JunctionId> = network
        .junctions()
        .filter(|&id| network.junction_ref(id).has_room())
        .collect();

    for _ in 0..target {
        let slot = rng.random_range(0..open.len());
        let junction = network.junction_mut(open[slot]);
        junction.occupancy += 1;
        if !junction.has_room() {
            open.swap_remove(slot);
        }
    }

    debug!(
        "Injection done: {} junctions still have room",
        open.len()
    );
    Ok(target)
}
