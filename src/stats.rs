//! Statistical summaries of a finished run
//!
//! Everything here is read-only over the final network and the occupancy
//! history; nothing feeds back into the simulation.

use log::info;
use std::collections::BTreeMap;

use crate::simulation::{Dynamics, PopulationHistory, SimNetwork, StreetId};

/// Fraction of junctions per degree
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DegreeDistribution {
    pub fractions: BTreeMap<usize, f64>,
    pub mean: f64,
}

pub fn degree_distribution(network: &SimNetwork) -> DegreeDistribution {
    let count = network.junction_count();
    if count == 0 {
        return DegreeDistribution::default();
    }

    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    let mut total = 0;
    for id in network.junctions() {
        let degree = network.degree(id);
        *counts.entry(degree).or_default() += 1;
        total += degree;
    }

    DegreeDistribution {
        fractions: counts
            .into_iter()
            .map(|(degree, n)| (degree, n as f64 / count as f64))
            .collect(),
        mean: total as f64 / count as f64,
    }
}

/// Marginal distribution p(n) of junction occupancy
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OccupancyDistribution {
    /// `probabilities[n]` is the fraction of junctions holding `n` cars
    pub probabilities: Vec<f64>,
    pub mean: f64,
    pub std_dev: f64,
}

pub fn occupancy_distribution(occupancies: &[u32]) -> OccupancyDistribution {
    let Some(&max) = occupancies.iter().max() else {
        return OccupancyDistribution::default();
    };

    let mut counts = vec![0usize; max as usize + 1];
    for &n in occupancies {
        counts[n as usize] += 1;
    }
    let total = occupancies.len() as f64;
    let probabilities: Vec<f64> = counts.into_iter().map(|c| c as f64 / total).collect();

    let mean: f64 = probabilities
        .iter()
        .enumerate()
        .map(|(n, p)| n as f64 * p)
        .sum();
    let variance: f64 = probabilities
        .iter()
        .enumerate()
        .map(|(n, p)| (n as f64 - mean).powi(2) * p)
        .sum();

    OccupancyDistribution {
        probabilities,
        mean,
        std_dev: variance.sqrt(),
    }
}

/// Population standard deviation of each junction's occupancy over time
pub fn junction_std_deviations(history: &PopulationHistory) -> Vec<f64> {
    let steps = history.steps();
    if steps == 0 {
        return vec![0.0; history.junction_count()];
    }

    (0..history.junction_count())
        .map(|junction| {
            let mean =
                history.junction_series(junction).map(f64::from).sum::<f64>() / steps as f64;
            let variance = history
                .junction_series(junction)
                .map(|n| (f64::from(n) - mean).powi(2))
                .sum::<f64>()
                / steps as f64;
            variance.sqrt()
        })
        .collect()
}

/// Equal-width histogram over `[min, max]`; returns `(bin start, count)`
pub fn histogram(values: &[f64], bins: usize) -> Vec<(f64, usize)> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min { (max - min) / bins as f64 } else { 1.0 };

    let mut counts = vec![0usize; bins];
    for &v in values {
        let bin = (((v - min) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| (min + i as f64 * width, count))
        .collect()
}

/// Totals of cumulative street flux
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FluxSummary {
    pub total: u64,
    pub max: u64,
    pub busiest: Option<StreetId>,
}

pub fn flux_summary(network: &SimNetwork) -> FluxSummary {
    let mut summary = FluxSummary::default();
    for (id, _, _) in network.streets() {
        let flux = network.flux(id).unwrap_or(0);
        summary.total += flux;
        if summary.busiest.is_none() || flux > summary.max {
            summary.max = flux;
            summary.busiest = Some(id);
        }
    }
    summary
}

/// Everything the CLI reports at the end of a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub dynamics: Dynamics,
    pub steps: usize,
    pub total_cars: u64,
    pub degrees: DegreeDistribution,
    pub occupancy: OccupancyDistribution,
    pub flux: FluxSummary,
    pub mean_junction_std: f64,
    pub junction_std_histogram: Vec<(f64, usize)>,
}

impl RunSummary {
    pub fn new(network: &SimNetwork, history: &PopulationHistory, dynamics: Dynamics) -> Self {
        let deviations = junction_std_deviations(history);
        let mean_junction_std = if deviations.is_empty() {
            0.0
        } else {
            deviations.iter().sum::<f64>() / deviations.len() as f64
        };

        Self {
            dynamics,
            steps: history.steps(),
            total_cars: network.total_occupancy(),
            degrees: degree_distribution(network),
            occupancy: occupancy_distribution(&network.occupancies()),
            flux: flux_summary(network),
            mean_junction_std,
            junction_std_histogram: histogram(&deviations, 10),
        }
    }

    pub fn log(&self) {
        info!("=== SIMULATION COMPLETE ===");
        info!("Dynamics: {}", self.dynamics);
        info!("Steps: {}", self.steps);
        info!("Total cars: {}", self.total_cars);
        info!("Mean degree: {:.2}", self.degrees.mean);
        for (degree, fraction) in &self.degrees.fractions {
            info!("  degree {}: {:.1}%", degree, fraction * 100.0);
        }
        info!("Occupancy mean: {:.2}", self.occupancy.mean);
        info!("Occupancy std: {:.2}", self.occupancy.std_dev);
        for (n, p) in self.occupancy.probabilities.iter().enumerate() {
            info!("  p({}) = {:.3}", n, p);
        }
        info!("Total flux: {}", self.flux.total);
        info!("Max street flux: {}", self.flux.max);
        info!("Mean junction deviation: {:.2}", self.mean_junction_std);
        for (start, count) in &self.junction_std_histogram {
            info!("  deviation >= {:.2}: {}", start, count);
        }
    }
}
