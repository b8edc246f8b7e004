//! Occupancy time series recorded during a run
//!
//! Stored row-major in one contiguous buffer: row `t` holds the snapshot the
//! step rule recorded at step `t`, one column per junction in enumeration
//! order.

/// `[steps x junctions]` table of occupancy snapshots
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PopulationHistory {
    junction_count: usize,
    steps: usize,
    values: Vec<u32>,
}

impl PopulationHistory {
    pub fn new(junction_count: usize) -> Self {
        Self {
            junction_count,
            steps: 0,
            values: Vec::new(),
        }
    }

    pub fn with_capacity(junction_count: usize, steps: usize) -> Self {
        Self {
            junction_count,
            steps: 0,
            values: Vec::with_capacity(junction_count * steps),
        }
    }

    /// Append one step's snapshot
    ///
    /// # Panics
    /// If the row length doesn't match the junction count.
    pub fn push_row(&mut self, row: &[u32]) {
        assert_eq!(
            row.len(),
            self.junction_count,
            "snapshot has {} entries, expected {}",
            row.len(),
            self.junction_count
        );
        self.values.extend_from_slice(row);
        self.steps += 1;
    }

    pub fn junction_count(&self) -> usize {
        self.junction_count
    }

    /// Number of recorded steps
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps == 0
    }

    pub fn row(&self, step: usize) -> Option<&[u32]> {
        if step >= self.steps {
            return None;
        }
        let start = step * self.junction_count;
        Some(&self.values[start..start + self.junction_count])
    }

    pub fn get(&self, step: usize, junction: usize) -> Option<u32> {
        if junction >= self.junction_count {
            return None;
        }
        self.row(step).map(|row| row[junction])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> + '_ {
        let width = self.junction_count;
        (0..self.steps).map(move |step| &self.values[step * width..(step + 1) * width])
    }

    /// Occupancy of one junction over time
    pub fn junction_series(&self, junction: usize) -> impl Iterator<Item = u32> + '_ {
        let valid = junction < self.junction_count;
        self.rows()
            .filter(move |_| valid)
            .map(move |row| row[junction])
    }

    /// Total cars recorded in a step's snapshot
    pub fn row_total(&self, step: usize) -> Option<u64> {
        self.row(step)
            .map(|row| row.iter().map(|&n| u64::from(n)).sum())
    }
}
