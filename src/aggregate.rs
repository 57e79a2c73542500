// aggregate.rs

use serde::Serialize;

use crate::model::{RoadRecord, Table};

/// Headline numbers for the current filter state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub road_count: usize,
    pub population: u64,
}

impl Summary {
    /// Counts `roads` and sums their linked population. When the road
    /// table has no population column at all the sum is reported as 0;
    /// otherwise roads missing a value contribute nothing.
    pub fn compute(roads: &[&RoadRecord], population_column_present: bool) -> Self {
        let population = if population_column_present {
            let total: f64 = roads.iter().filter_map(|road| road.population).sum();
            truncate_population(total)
        } else {
            0
        };
        Summary {
            road_count: roads.len(),
            population,
        }
    }

    pub fn for_table(table: &Table<RoadRecord>, roads: &[&RoadRecord], population_column: &str) -> Self {
        Self::compute(roads, table.has_column(population_column))
    }
}

/// Whole-number display value; fractions are dropped, negatives clamp to 0.
pub fn truncate_population(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.trunc() as u64
    } else {
        0
    }
}
