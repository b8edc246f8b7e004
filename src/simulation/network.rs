//! Network graph holding per-junction occupancy and per-street flux
//!
//! The topology is fixed once the network is built. Only occupancy and flux
//! change during a run, and `reset` clears both.

use log::warn;
use ordered_float::OrderedFloat;
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

use super::error::{SimError, SimResult};
use super::types::{Junction, JunctionId, Position, Street, StreetId};

/// Simple undirected network of capacity-bounded junctions
#[derive(Debug, Clone)]
pub struct SimNetwork {
    /// The underlying petgraph graph; node and edge indices are stable
    graph: UnGraph<Junction, Street>,

    /// Neighbors of every junction with the connecting street, built once
    adjacency: Vec<Vec<(JunctionId, StreetId)>>,
}

impl SimNetwork {
    /// Wrap an externally built graph, rejecting anything that isn't a simple
    /// graph of positive-capacity junctions
    pub fn from_graph(graph: UnGraph<Junction, Street>) -> SimResult<Self> {
        if let Some(junction) = graph.node_indices().find(|&n| graph[n].capacity == 0) {
            return Err(SimError::InvalidConfiguration(format!(
                "junction {} has zero capacity",
                JunctionId(junction)
            )));
        }

        if let Some(junction) = graph
            .node_indices()
            .find(|&n| graph[n].occupancy > graph[n].capacity)
        {
            return Err(SimError::InvalidConfiguration(format!(
                "junction {} holds {} cars but its capacity is {}",
                JunctionId(junction),
                graph[junction].occupancy,
                graph[junction].capacity
            )));
        }

        let mut adjacency: Vec<Vec<(JunctionId, StreetId)>> =
            vec![Vec::new(); graph.node_count()];
        for edge in graph.edge_references() {
            let (a, b) = (edge.source(), edge.target());
            if a == b {
                return Err(SimError::InvalidTopology(format!(
                    "self loop at junction {}",
                    JunctionId(a)
                )));
            }
            if adjacency[a.index()].iter().any(|(other, _)| other.0 == b) {
                return Err(SimError::InvalidTopology(format!(
                    "parallel streets between {} and {}",
                    JunctionId(a),
                    JunctionId(b)
                )));
            }
            let street = StreetId(edge.id());
            adjacency[a.index()].push((JunctionId(b), street));
            adjacency[b.index()].push((JunctionId(a), street));
        }

        Ok(Self { graph, adjacency })
    }

    /// Set every occupancy and every flux back to zero
    pub fn reset(&mut self) {
        for junction in self.graph.node_weights_mut() {
            junction.occupancy = 0;
        }
        for street in self.graph.edge_weights_mut() {
            street.flux = 0;
        }
    }

    /// Give every junction the same capacity. Fails without changing anything
    /// if the capacity is zero or below a junction's current occupancy.
    pub fn set_capacity(&mut self, capacity: u32) -> SimResult<()> {
        if capacity == 0 {
            return Err(SimError::InvalidConfiguration(
                "junction capacity must be positive".into(),
            ));
        }
        if let Some(id) = self.junctions().find(|&id| self.junction_ref(id).occupancy > capacity) {
            return Err(SimError::InvalidConfiguration(format!(
                "junction {} already holds {} cars, more than capacity {}",
                id,
                self.junction_ref(id).occupancy,
                capacity
            )));
        }
        for junction in self.graph.node_weights_mut() {
            junction.capacity = capacity;
        }
        Ok(())
    }

    pub fn junction_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn street_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All junctions in enumeration order; both step rules visit them in
    /// exactly this order
    pub fn junctions(&self) -> impl Iterator<Item = JunctionId> + '_ {
        self.graph.node_indices().map(JunctionId)
    }

    /// All streets as `(id, endpoint, endpoint)`
    pub fn streets(&self) -> impl Iterator<Item = (StreetId, JunctionId, JunctionId)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (StreetId(e.id()), JunctionId(e.source()), JunctionId(e.target())))
    }

    pub fn contains(&self, id: JunctionId) -> bool {
        id.index() < self.graph.node_count()
    }

    pub fn junction(&self, id: JunctionId) -> Option<&Junction> {
        self.graph.node_weight(id.0)
    }

    pub fn street(&self, id: StreetId) -> Option<&Street> {
        self.graph.edge_weight(id.0)
    }

    /// Neighbors of a junction paired with the street leading to each
    pub fn neighbors(&self, id: JunctionId) -> &[(JunctionId, StreetId)] {
        self.adjacency
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn degree(&self, id: JunctionId) -> usize {
        self.neighbors(id).len()
    }

    /// Finds the street connecting two junctions
    pub fn street_between(&self, a: JunctionId, b: JunctionId) -> Option<StreetId> {
        self.graph.find_edge(a.0, b.0).map(StreetId)
    }

    pub fn occupancy(&self, id: JunctionId) -> SimResult<u32> {
        self.junction(id)
            .map(|j| j.occupancy)
            .ok_or(SimError::UnknownJunction(id))
    }

    pub fn capacity(&self, id: JunctionId) -> SimResult<u32> {
        self.junction(id)
            .map(|j| j.capacity)
            .ok_or(SimError::UnknownJunction(id))
    }

    pub fn flux(&self, id: StreetId) -> Option<u64> {
        self.street(id).map(|s| s.flux)
    }

    /// Occupancy of every junction in enumeration order
    pub fn occupancies(&self) -> Vec<u32> {
        self.graph.node_weights().map(|j| j.occupancy).collect()
    }

    pub fn total_occupancy(&self) -> u64 {
        self.graph.node_weights().map(|j| u64::from(j.occupancy)).sum()
    }

    pub fn total_capacity(&self) -> u64 {
        self.graph.node_weights().map(|j| u64::from(j.capacity)).sum()
    }

    /// Cars moved over all streets since the last reset
    pub fn total_flux(&self) -> u64 {
        self.graph.edge_weights().map(|s| s.flux).sum()
    }

    /// Free slots left across the whole network
    pub fn total_headroom(&self) -> u64 {
        self.graph.node_weights().map(|j| u64::from(j.headroom())).sum()
    }

    // Hot-loop accessors used by the injector and step rules. Ids come from
    // this network, so indexing can't go out of bounds.

    pub(crate) fn junction_mut(&mut self, id: JunctionId) -> &mut Junction {
        &mut self.graph[id.0]
    }

    pub(crate) fn junction_ref(&self, id: JunctionId) -> &Junction {
        &self.graph[id.0]
    }

    pub(crate) fn add_flux(&mut self, id: StreetId, cars: u64) {
        self.graph[id.0].flux += cars;
    }

    /// Consume the network, returning the raw petgraph graph
    pub fn into_graph(self) -> UnGraph<Junction, Street> {
        self.graph
    }
}

/// Incrementally builds a `SimNetwork` from junctions and street segments
///
/// Junctions are identified by exact coordinates, so two segments sharing an
/// endpoint are connected at the same junction.
pub struct NetworkBuilder {
    graph: UnGraph<Junction, Street>,
    capacity: u32,
    position_to_junction: HashMap<(OrderedFloat<f64>, OrderedFloat<f64>), JunctionId>,
}

impl NetworkBuilder {
    /// Every junction added by this builder gets `capacity`
    pub fn new(capacity: u32) -> Self {
        Self {
            graph: UnGraph::default(),
            capacity,
            position_to_junction: HashMap::new(),
        }
    }

    /// Adds a junction at `position`, or returns the one already there
    pub fn add_junction(&mut self, position: Position) -> JunctionId {
        let key = (OrderedFloat(position.x), OrderedFloat(position.y));
        if let Some(&id) = self.position_to_junction.get(&key) {
            return id;
        }

        let id = JunctionId(self.graph.add_node(Junction::new(position, self.capacity)));
        self.position_to_junction.insert(key, id);
        id
    }

    /// Connects two junctions. Self loops are skipped; connecting an already
    /// connected pair updates the existing street's length.
    pub fn add_street(&mut self, a: JunctionId, b: JunctionId, length: f64) -> Option<StreetId> {
        if a == b {
            warn!("Skipping self loop at junction {}", a);
            return None;
        }

        if let Some(existing) = self.graph.find_edge(a.0, b.0) {
            self.graph[existing].length = length;
            return Some(StreetId(existing));
        }

        Some(StreetId(self.graph.add_edge(a.0, b.0, Street::new(length))))
    }

    /// Adds a street segment between two positions. Without an explicit
    /// length the straight-line distance is used.
    pub fn add_segment(
        &mut self,
        start: Position,
        end: Position,
        length: Option<f64>,
    ) -> Option<StreetId> {
        let a = self.add_junction(start);
        let b = self.add_junction(end);
        let length = length.unwrap_or_else(|| start.distance(&end));
        self.add_street(a, b, length)
    }

    pub fn junction_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn build(self) -> SimResult<SimNetwork> {
        SimNetwork::from_graph(self.graph)
    }
}
