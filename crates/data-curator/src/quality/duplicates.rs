//! Duplicate column detection with base-column resolution.
//!
//! Two columns are equal when, after dropping every row where either is
//! missing, at least one row remains and all remaining values match.
//! Equal pairs form a graph; each connected component keeps one base column
//! (fewest missing values, then leftmost) and every other member fails.

use crate::error::{Result, ResultExt};
use crate::profiler::ColumnStats;
use crate::types::Verdict;
use crate::utils::{Cell, column_cells};
use polars::prelude::*;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Outcome of the duplicate check for one dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DuplicateReport {
    pub verdicts: BTreeMap<String, Verdict>,
    /// Failing column -> base column.
    pub bases: BTreeMap<String, String>,
}

/// Run the duplicate check over every column pair of a dataset.
pub fn duplicate_check(df: &DataFrame, stats: &[ColumnStats]) -> Result<DuplicateReport> {
    let cells: Vec<Vec<Option<Cell>>> = df
        .get_columns()
        .iter()
        .map(|column| column_cells(column.as_materialized_series()))
        .collect::<PolarsResult<_>>()
        .context("Failed to materialize columns for duplicate check")?;

    let n = cells.len();
    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect();

    // Indexed collect keeps pair order regardless of scheduling.
    let equal_pairs: Vec<(usize, usize)> = pairs
        .par_iter()
        .filter(|(i, j)| columns_equal(&cells[*i], &cells[*j]))
        .copied()
        .collect();

    let mut clusters = DisjointSet::new(n);
    for &(i, j) in &equal_pairs {
        clusters.union(i, j);
    }

    let mut report = DuplicateReport {
        verdicts: stats
            .iter()
            .map(|s| (s.name.clone(), Verdict::Pass))
            .collect(),
        bases: BTreeMap::new(),
    };

    for members in clusters.components() {
        if members.len() < 2 {
            continue;
        }
        let Some(&base) = members
            .iter()
            .min_by_key(|&&idx| (stats[idx].missing, stats[idx].position))
        else {
            continue;
        };
        let base_name = &stats[base].name;
        for &idx in members.iter().filter(|&&idx| idx != base) {
            let name = &stats[idx].name;
            report.verdicts.insert(name.clone(), Verdict::Fail);
            report.bases.insert(name.clone(), base_name.clone());
        }
        debug!(
            "duplicate cluster {:?} resolved to base column {}",
            members.iter().map(|&idx| &stats[idx].name).collect::<Vec<_>>(),
            base_name
        );
    }

    Ok(report)
}

/// Equality over rows where both columns are present, with at least one such row.
fn columns_equal(a: &[Option<Cell>], b: &[Option<Cell>]) -> bool {
    let mut shared = 0usize;
    for (left, right) in a.iter().zip(b) {
        if let (Some(left), Some(right)) = (left, right) {
            if left != right {
                return false;
            }
            shared += 1;
        }
    }
    shared > 0
}

/// Union-find over column positions.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }

    /// Components as sorted member lists, ordered by their smallest member.
    fn components(&mut self) -> Vec<Vec<usize>> {
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for x in 0..self.parent.len() {
            let root = self.find(x);
            groups.entry(root).or_default().push(x);
        }
        groups.into_values().collect()
    }
}
