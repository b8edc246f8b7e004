//! Behavioral checks of the simulation core
//!
//! Every property is checked over a range of seeds with a seeded `StdRng`.

use petgraph::graph::UnGraph;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

use traffic_flow::segments;
use traffic_flow::simulation::{
    inject_load, sample_batch, simulate, step_sequential, step_synchronous, Dynamics, Junction,
    JunctionId, NetworkBuilder, Position, SimConfig, SimError, SimNetwork, Street,
    TrafficSimulation,
};

const SEEDS: u64 = 50;
const BOTH: [Dynamics; 2] = [Dynamics::Sequential, Dynamics::Synchronous];

fn two_junctions(capacity: u32) -> SimNetwork {
    let mut builder = NetworkBuilder::new(capacity);
    builder.add_segment(Position::new(0.0, 0.0), Position::new(1.0, 0.0), None);
    builder.build().unwrap()
}

fn isolated_junction(capacity: u32) -> SimNetwork {
    let mut builder = NetworkBuilder::new(capacity);
    builder.add_junction(Position::new(0.0, 0.0));
    builder.build().unwrap()
}

/// Three leaves holding `leaf_cars` each around a hub of capacity `hub_capacity`
fn star(hub_capacity: u32, leaf_cars: u32) -> SimNetwork {
    let mut graph = UnGraph::default();
    let hub = graph.add_node(Junction::new(Position::new(0.0, 0.0), hub_capacity));
    for i in 0..3 {
        let mut leaf = Junction::new(Position::new(i as f64 + 1.0, 1.0), leaf_cars.max(1));
        leaf.occupancy = leaf_cars;
        let leaf = graph.add_node(leaf);
        graph.add_edge(leaf, hub, Street::new(1.0));
    }
    SimNetwork::from_graph(graph).unwrap()
}

/// A grid with a few extra isolated junctions and uneven degrees
fn mixed_network(capacity: u32) -> SimNetwork {
    let mut builder = NetworkBuilder::new(capacity);
    for row in 0..4 {
        for col in 0..4 {
            let here = Position::new(col as f64, row as f64);
            if col < 3 {
                builder.add_segment(here, Position::new(col as f64 + 1.0, row as f64), None);
            }
            if row < 3 && col % 2 == 0 {
                builder.add_segment(here, Position::new(col as f64, row as f64 + 1.0), None);
            }
        }
    }
    builder.add_segment(Position::new(0.0, 0.0), Position::new(3.0, 3.0), None);
    builder.add_junction(Position::new(10.0, 10.0));
    builder.add_junction(Position::new(-10.0, 10.0));
    builder.build().unwrap()
}

fn fluxes(network: &SimNetwork) -> Vec<u64> {
    network
        .streets()
        .map(|(id, _, _)| network.flux(id).unwrap())
        .collect()
}

fn assert_within_capacity(network: &SimNetwork) {
    for id in network.junctions() {
        let junction = network.junction(id).unwrap();
        assert!(
            junction.occupancy <= junction.capacity,
            "junction {} holds {} cars, capacity {}",
            id,
            junction.occupancy,
            junction.capacity
        );
    }
}

#[test]
fn test_capacity_conservation_and_flux_every_step() {
    for dynamics in BOTH {
        for seed in 0..SEEDS {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut simulation = TrafficSimulation::new(mixed_network(6), 4);
            simulation.reset();
            let injected = simulation.inject(4.5, &mut rng).unwrap();
            let mut previous = fluxes(simulation.network());

            for _ in 0..40 {
                let snapshot = simulation.step(dynamics, &mut rng);
                assert!(snapshot.iter().all(|&n| n <= 6));

                let network = simulation.network();
                assert_within_capacity(network);
                assert_eq!(network.total_occupancy(), injected);

                let current = fluxes(network);
                for (before, after) in previous.iter().zip(&current) {
                    assert!(after >= before, "flux decreased under {}", dynamics);
                }
                previous = current;
            }
        }
    }
}

#[test]
fn test_history_rows_conserve_cars() {
    for dynamics in BOTH {
        for seed in 0..SEEDS {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut simulation = TrafficSimulation::new(mixed_network(8), 3);
            let history = simulation.simulate(25, 3.0, dynamics, &mut rng).unwrap();

            assert_eq!(history.steps(), 25);
            assert_eq!(history.junction_count(), simulation.network().junction_count());
            let expected = simulation.network().total_occupancy();
            for step in 0..history.steps() {
                assert!(history.row(step).unwrap().iter().all(|&n| n <= 8));
                if dynamics == Dynamics::Synchronous {
                    assert_eq!(history.row_total(step), Some(expected));
                }
            }
        }
    }
}

#[test]
fn test_synchronous_snapshot_is_start_of_step_state() {
    for seed in 0..SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut network = mixed_network(5);
        inject_load(&mut network, 2.0, &mut rng).unwrap();

        let before = network.occupancies();
        let snapshot = step_synchronous(&mut network, 3, &mut rng);
        assert_eq!(snapshot, before);
    }
}

#[test]
fn test_sequential_snapshot_sees_earlier_inflow() {
    let mut saw_inflow = false;
    for seed in 0..SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut network = two_junctions(10);
        let first = JunctionId::new(0);
        let second = JunctionId::new(1);
        network.reset();
        // Load only the first junction so the second one starts empty
        let mut graph = network.into_graph();
        graph[first.0].occupancy = 3;
        let mut network = SimNetwork::from_graph(graph).unwrap();

        let snapshot = step_sequential(&mut network, 3, &mut rng);
        let street = network.street_between(first, second).unwrap();
        let flux = network.flux(street).unwrap();
        let final_second = u64::from(network.occupancy(second).unwrap());

        // The first junction is recorded before it moves anything
        assert_eq!(snapshot[0], 3);
        // The second is recorded after receiving m cars and before sending
        // b back: flux = m + b and final = m - b
        assert_eq!(2 * u64::from(snapshot[1]), flux + final_second);
        saw_inflow |= snapshot[1] > 0;
    }
    assert!(saw_inflow);
}

#[test]
fn test_injection_exactness() {
    for seed in 0..SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut network = mixed_network(4);
        let count = network.junction_count() as f64;
        for load in [0.0, 0.3, 1.0, 2.75, 4.0] {
            network.reset();
            let placed = inject_load(&mut network, load, &mut rng).unwrap();
            assert_eq!(placed, (load * count).floor() as u64);
            assert_eq!(network.total_occupancy(), placed);
            assert_within_capacity(&network);
        }
    }
}

#[test]
fn test_full_load_fills_every_junction() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut network = mixed_network(3);
    inject_load(&mut network, 3.0, &mut rng).unwrap();
    assert!(network.occupancies().iter().all(|&n| n == 3));
}

#[test]
fn test_injection_capacity_exceeded() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut network = two_junctions(2);

    let err = inject_load(&mut network, 2.5, &mut rng).unwrap_err();
    assert_eq!(
        err,
        SimError::CapacityExceeded {
            requested: 5,
            available: 4
        }
    );
    assert_eq!(network.total_occupancy(), 0);

    let mut simulation = TrafficSimulation::new(two_junctions(2), 1);
    assert!(matches!(
        simulation.simulate(10, 3.0, Dynamics::Sequential, &mut rng),
        Err(SimError::CapacityExceeded { .. })
    ));
    assert_eq!(simulation.network().total_flux(), 0);
}

#[test]
fn test_invalid_run_parameters_leave_network_untouched() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut simulation = TrafficSimulation::new(two_junctions(10), 3);
    simulation.inject(2.0, &mut rng).unwrap();

    for (steps, load) in [(0, 1.0), (5, -1.0), (5, f64::INFINITY)] {
        assert!(matches!(
            simulation.simulate(steps, load, Dynamics::Synchronous, &mut rng),
            Err(SimError::InvalidConfiguration(_))
        ));
        assert_eq!(simulation.network().total_occupancy(), 4);
    }
}

#[test]
fn test_determinism() {
    for dynamics in BOTH {
        let run = || {
            let config = SimConfig {
                capacity: 7,
                transport_capacity: 3,
                steps: 30,
                load: 3.5,
                dynamics,
                seed: Some(1234),
            };
            simulate(mixed_network(7), &config).unwrap()
        };
        let (first_network, first_history) = run();
        let (second_network, second_history) = run();
        assert_eq!(first_history, second_history);
        assert_eq!(fluxes(&first_network), fluxes(&second_network));
        assert_eq!(first_network.occupancies(), second_network.occupancies());
    }
}

#[test]
fn test_rerun_resets_previous_state() {
    let mut simulation = TrafficSimulation::new(mixed_network(5), 2);
    let mut rng = StdRng::seed_from_u64(99);
    simulation
        .simulate(20, 2.0, Dynamics::Sequential, &mut rng)
        .unwrap();
    simulation
        .simulate(1, 1.0, Dynamics::Sequential, &mut rng)
        .unwrap();

    let network = simulation.network();
    assert_eq!(network.total_occupancy(), network.junction_count() as u64);
    // One step: each junction sends at most one batch of at most tc cars
    assert!(network.total_flux() <= 2 * network.junction_count() as u64);
}

#[test]
fn test_two_junction_scenario() {
    for seed in 0..SEEDS {
        let config = SimConfig {
            capacity: 10,
            transport_capacity: 3,
            steps: 1,
            load: 1.0,
            dynamics: Dynamics::Sequential,
            seed: Some(seed),
        };
        let (network, history) = simulate(two_junctions(10), &config).unwrap();
        let a = network.occupancy(JunctionId::new(0)).unwrap();
        let b = network.occupancy(JunctionId::new(1)).unwrap();
        assert_eq!(a + b, 2);
        assert!(a <= 10 && b <= 10);
        assert_eq!(history.steps(), 1);

        // Each endpoint sends at most one batch, and only 2 cars exist
        let street = network
            .street_between(JunctionId::new(0), JunctionId::new(1))
            .unwrap();
        assert!(network.flux(street).unwrap() <= 4);
    }
}

#[test]
fn test_isolated_junction_never_changes() {
    for dynamics in BOTH {
        for seed in 0..SEEDS {
            let config = SimConfig {
                capacity: 10,
                transport_capacity: 3,
                steps: 5,
                load: 6.0,
                dynamics,
                seed: Some(seed),
            };
            let (network, history) = simulate(isolated_junction(10), &config).unwrap();
            assert_eq!(network.occupancy(JunctionId::new(0)).unwrap(), 6);
            assert_eq!(history.junction_series(0).collect::<Vec<_>>(), vec![6; 5]);
        }
    }
}

#[test]
fn test_isolated_junctions_in_larger_network() {
    for dynamics in BOTH {
        let mut rng = StdRng::seed_from_u64(11);
        let mut simulation = TrafficSimulation::new(mixed_network(9), 5);
        simulation.reset();
        simulation.inject(5.0, &mut rng).unwrap();

        let isolated: Vec<_> = simulation
            .network()
            .junctions()
            .filter(|&id| simulation.network().degree(id) == 0)
            .collect();
        assert_eq!(isolated.len(), 2);
        let before: Vec<u32> = isolated
            .iter()
            .map(|&id| simulation.network().occupancy(id).unwrap())
            .collect();

        for _ in 0..20 {
            simulation.step(dynamics, &mut rng);
        }

        let after: Vec<u32> = isolated
            .iter()
            .map(|&id| simulation.network().occupancy(id).unwrap())
            .collect();
        assert_eq!(before, after);
    }
}

#[test]
fn test_synchronous_hub_admission_is_capped() {
    let mut admitted_some = false;
    for seed in 0..SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut network = star(2, 5);
        let hub = JunctionId::new(0);

        step_synchronous(&mut network, 5, &mut rng);

        assert!(network.occupancy(hub).unwrap() <= 2);
        assert_eq!(network.total_occupancy(), 15);
        assert_within_capacity(&network);
        admitted_some |= network.occupancy(hub).unwrap() > 0;
    }
    assert!(admitted_some);
}

#[test]
fn test_zero_transport_capacity_moves_nothing() {
    for dynamics in BOTH {
        let mut rng = StdRng::seed_from_u64(5);
        let mut simulation = TrafficSimulation::new(mixed_network(6), 0);
        let history = simulation.simulate(10, 3.0, dynamics, &mut rng).unwrap();
        assert_eq!(simulation.network().total_flux(), 0);
        assert_eq!(history.row(0), history.row(9));
    }
}

#[test]
fn test_grid_run_from_segments() {
    let network = segments::grid(5, 5, 2.0, 10).unwrap();
    let config = SimConfig {
        steps: 15,
        seed: Some(21),
        dynamics: Dynamics::Synchronous,
        ..SimConfig::default()
    };
    let (network, history) = simulate(network, &config).unwrap();
    assert_eq!(network.total_occupancy(), 75);
    assert_eq!(history.steps(), 15);
    assert!(network.total_flux() > 0);
}

#[test]
fn test_simulate_rejects_invalid_config() {
    let config = SimConfig {
        steps: 0,
        ..SimConfig::default()
    };
    assert!(matches!(
        simulate(two_junctions(10), &config),
        Err(SimError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_batch_size_covers_full_range() {
    let mut rng = StdRng::seed_from_u64(17);
    for (cars, transport_capacity) in [(2u32, 5u32), (9, 3)] {
        let limit = cars.min(transport_capacity);
        let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
        for _ in 0..5000 {
            let moved = sample_batch(cars, transport_capacity, &mut rng);
            assert!(moved <= limit);
            *counts.entry(moved).or_default() += 1;
        }

        let drawn: Vec<u32> = counts.keys().copied().collect();
        assert_eq!(drawn, (0..=limit).collect::<Vec<_>>());
        // Roughly uniform: each value near 5000 / (limit + 1)
        let expected = 5000 / (limit as usize + 1);
        for (&value, &count) in &counts {
            assert!(
                count > expected * 3 / 4 && count < expected * 5 / 4,
                "value {} drawn {} times, expected about {}",
                value,
                count,
                expected
            );
        }
    }
}

#[test]
fn test_simulate_applies_configured_capacity() {
    for seed in 0..SEEDS {
        let config = SimConfig {
            capacity: 2,
            load: 1.5,
            steps: 10,
            seed: Some(seed),
            ..SimConfig::default()
        };
        let (network, _) = simulate(two_junctions(10), &config).unwrap();
        assert_eq!(network.total_capacity(), 4);
        assert_eq!(network.total_occupancy(), 3);
        assert_within_capacity(&network);
    }

    let overloaded = SimConfig {
        capacity: 2,
        load: 5.0,
        seed: Some(1),
        ..SimConfig::default()
    };
    assert!(matches!(
        simulate(two_junctions(10), &overloaded),
        Err(SimError::CapacityExceeded {
            requested: 10,
            available: 4
        })
    ));
}

#[test]
fn test_sequential_admission_near_capacity_limit() {
    let mut graph = UnGraph::default();
    let mut sender = Junction::new(Position::new(0.0, 0.0), 10);
    sender.occupancy = 3;
    let mut receiver = Junction::new(Position::new(1.0, 0.0), u32::MAX);
    receiver.occupancy = u32::MAX - 1;
    let sender = graph.add_node(sender);
    let receiver = graph.add_node(receiver);
    graph.add_edge(sender, receiver, Street::new(1.0));

    for seed in 0..SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut network = SimNetwork::from_graph(graph.clone()).unwrap();
        step_sequential(&mut network, 3, &mut rng);
        assert_within_capacity(&network);
        assert_eq!(network.total_occupancy(), 3 + u64::from(u32::MAX - 1));
    }
}

#[test]
fn test_from_graph_rejects_overfull_junction() {
    let mut graph: UnGraph<Junction, Street> = UnGraph::default();
    let mut junction = Junction::new(Position::new(0.0, 0.0), 2);
    junction.occupancy = 5;
    graph.add_node(junction);
    assert!(matches!(
        SimNetwork::from_graph(graph),
        Err(SimError::InvalidConfiguration(_))
    ));
}
