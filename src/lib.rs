//! Traffic Flow Library
//!
//! A discrete-time, capacity-constrained traffic flow simulation on a street
//! network, with helpers for loading networks and summarizing runs.

pub mod segments;
pub mod simulation;
pub mod stats;
