//! Core types for the traffic flow simulation
//!
//! Junctions and streets are stored in a petgraph graph; the ids below wrap
//! its indices so callers can't mix up node and edge handles.

use petgraph::graph::{EdgeIndex, NodeIndex};
use std::fmt;

/// A wrapper type for junction (node) IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JunctionId(pub NodeIndex);

impl JunctionId {
    pub fn new(index: usize) -> Self {
        Self(NodeIndex::new(index))
    }

    pub fn index(&self) -> usize {
        self.0.index()
    }
}

impl fmt::Display for JunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "J{}", self.0.index())
    }
}

/// A wrapper type for street (edge) IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreetId(pub EdgeIndex);

impl StreetId {
    pub fn new(index: usize) -> Self {
        Self(EdgeIndex::new(index))
    }

    pub fn index(&self) -> usize {
        self.0.index()
    }
}

/// A 2D position of a junction
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A node of the network: holds up to `capacity` cars
#[derive(Debug, Clone, PartialEq)]
pub struct Junction {
    pub position: Position,
    /// Cars currently waiting at this junction
    pub occupancy: u32,
    /// Maximum number of cars the junction can hold
    pub capacity: u32,
}

impl Junction {
    pub fn new(position: Position, capacity: u32) -> Self {
        Self {
            position,
            occupancy: 0,
            capacity,
        }
    }

    /// Room left before the junction is full
    pub fn headroom(&self) -> u32 {
        self.capacity.saturating_sub(self.occupancy)
    }

    pub fn has_room(&self) -> bool {
        self.occupancy < self.capacity
    }
}

/// An undirected street between two junctions
#[derive(Debug, Clone, PartialEq)]
pub struct Street {
    /// Geometric length; not used by the dynamics
    pub length: f64,
    /// Cars ever moved over this street during the current run
    pub flux: u64,
}

impl Street {
    pub fn new(length: f64) -> Self {
        Self { length, flux: 0 }
    }
}
