//! Street network input
//!
//! Networks come from a plain-text list of street segments, one per line:
//!
//! ```text
//! # x1 y1 x2 y2 [length]
//! 0 0 10 0
//! 10 0 10 10 14.2
//! ```
//!
//! Fields may be separated by whitespace or commas. Only the two endpoints of
//! a segment matter; when no length is given the straight-line distance is
//! used.

use anyhow::{bail, Context, Result};
use log::info;
use std::fs;
use std::path::Path;

use crate::simulation::{NetworkBuilder, Position, SimNetwork};

/// One street segment as read from input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Position,
    pub end: Position,
    pub length: Option<f64>,
}

/// Parse a single non-empty, non-comment line
fn parse_segment(line: &str) -> Result<Segment> {
    let fields: Vec<f64> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|field| !field.is_empty())
        .map(|field| {
            field
                .parse::<f64>()
                .with_context(|| format!("'{}' is not a number", field))
        })
        .collect::<Result<_>>()?;

    if fields.iter().any(|v| !v.is_finite()) {
        bail!("coordinates and lengths must be finite");
    }

    let (coords, length) = match fields.len() {
        4 => (&fields[..4], None),
        5 => (&fields[..4], Some(fields[4])),
        n => bail!("expected 4 or 5 fields, found {}", n),
    };

    if let Some(length) = length {
        if length < 0.0 {
            bail!("segment length must not be negative");
        }
    }

    Ok(Segment {
        start: Position::new(coords[0], coords[1]),
        end: Position::new(coords[2], coords[3]),
        length,
    })
}

/// Parse a whole segment list
pub fn parse_segments(text: &str) -> Result<Vec<Segment>> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let line = line.split('#').next().unwrap_or("").trim();
            (!line.is_empty()).then_some((index, line))
        })
        .map(|(index, line)| {
            parse_segment(line).with_context(|| format!("invalid segment on line {}", index + 1))
        })
        .collect()
}

/// Build a network with every junction at `capacity` from a list of segments
pub fn network_from_segments(segments: &[Segment], capacity: u32) -> Result<SimNetwork> {
    let mut builder = NetworkBuilder::new(capacity);
    for segment in segments {
        builder.add_segment(segment.start, segment.end, segment.length);
    }

    let network = builder.build()?;
    info!(
        "Built network with {} junctions and {} streets",
        network.junction_count(),
        network.street_count()
    );
    Ok(network)
}

/// Read a segment file and build its network
pub fn load_network(path: &Path, capacity: u32) -> Result<SimNetwork> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read segment file {}", path.display()))?;
    let segments =
        parse_segments(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
    network_from_segments(&segments, capacity)
}

/// Rectangular grid of `width x height` junctions spaced `spacing` apart,
/// each connected to its right and lower neighbor
pub fn grid(width: usize, height: usize, spacing: f64, capacity: u32) -> Result<SimNetwork> {
    if width == 0 || height == 0 {
        bail!("grid dimensions must be positive, got {}x{}", width, height);
    }

    let mut builder = NetworkBuilder::new(capacity);
    let at = |col: usize, row: usize| Position::new(col as f64 * spacing, row as f64 * spacing);

    for row in 0..height {
        for col in 0..width {
            builder.add_junction(at(col, row));
        }
    }
    for row in 0..height {
        for col in 0..width {
            if col + 1 < width {
                builder.add_segment(at(col, row), at(col + 1, row), None);
            }
            if row + 1 < height {
                builder.add_segment(at(col, row), at(col, row + 1), None);
            }
        }
    }

    Ok(builder.build()?)
}
