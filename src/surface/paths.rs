//! Least-cost paths across a [`CostSurface`].
//!
//! The lattice is treated as a 4-connected grid graph. Stepping into a cell
//! costs that cell's interpolated value, floored at 0 so Dijkstra's
//! non-negative edge requirement holds.
//!
//! # References
//!
//! - Dijkstra (1959), "A note on two problems in connexion with graphs"

use super::types::{CostSurface, GridCoord};
use crate::error::{EngineError, Result};
use crate::geo::LatLng;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::debug;

/// Cheapest route between two snapped endpoints.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct CostPath {
    /// Requested start point.
    pub start: LatLng,
    /// Requested end point.
    pub end: LatLng,
    /// Cells from start to end inclusive.
    pub cells: Vec<GridCoord>,
    /// Sum of entry costs for every cell after the first.
    pub total_cost: f64,
}

impl CostPath {
    /// Lattice locations along the path.
    pub fn waypoints(&self, surface: &CostSurface) -> Vec<LatLng> {
        self.cells
            .iter()
            .filter_map(|&coord| surface.cell(coord).map(|cell| cell.location))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Min-heap entry. Ties on cost break on the lower cell index so search
/// order is deterministic.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Frontier {
    cost: f64,
    index: usize,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Finds a least-cost path for each `(start, end)` pair.
///
/// Endpoints snap to their nearest lattice point. Paths are returned in the
/// order of `endpoints`.
///
/// # Errors
/// [`EngineError::InvalidInput`] if an endpoint lies outside the surface
/// bounds or the surface has no cells.
///
/// # Complexity
/// O(P · V log V) for P pairs over V cells
pub fn derive_paths(surface: &CostSurface, endpoints: &[(LatLng, LatLng)]) -> Result<Vec<CostPath>> {
    if surface.cells().is_empty() {
        return Err(EngineError::invalid("surface has no cells"));
    }
    debug!(
        pairs = endpoints.len(),
        cells = surface.cells().len(),
        "deriving least-cost paths"
    );

    endpoints
        .iter()
        .map(|(start, end)| {
            let from = snap(surface, start)?;
            let to = snap(surface, end)?;
            let (cells, total_cost) = shortest_path(surface, from, to);
            Ok(CostPath {
                start: *start,
                end: *end,
                cells,
                total_cost,
            })
        })
        .collect()
}

fn snap(surface: &CostSurface, point: &LatLng) -> Result<GridCoord> {
    surface.nearest_coord(point).ok_or_else(|| {
        EngineError::invalid(format!(
            "endpoint ({}, {}) outside surface bounds",
            point.lat, point.lng
        ))
    })
}

fn neighbors(surface: &CostSurface, coord: GridCoord) -> impl Iterator<Item = GridCoord> {
    let (rows, cols) = (surface.rows(), surface.cols());
    let GridCoord { row, col } = coord;
    [
        (row > 0).then(|| GridCoord { row: row - 1, col }),
        (row + 1 < rows).then(|| GridCoord { row: row + 1, col }),
        (col > 0).then(|| GridCoord { row, col: col - 1 }),
        (col + 1 < cols).then(|| GridCoord { row, col: col + 1 }),
    ]
    .into_iter()
    .flatten()
}

/// Dijkstra from `from` to `to`. The grid is connected, so a path always
/// exists.
fn shortest_path(surface: &CostSurface, from: GridCoord, to: GridCoord) -> (Vec<GridCoord>, f64) {
    if from == to {
        return (vec![from], 0.0);
    }

    let n = surface.cells().len();
    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<GridCoord>> = vec![None; n];
    let mut heap = BinaryHeap::new();

    let source = surface.index_of(from);
    let target = surface.index_of(to);
    dist[source] = 0.0;
    heap.push(Frontier {
        cost: 0.0,
        index: source,
    });

    while let Some(Frontier { cost, index }) = heap.pop() {
        if index == target {
            break;
        }
        if cost > dist[index] {
            continue;
        }
        let here = surface.cells()[index].coord;
        for next in neighbors(surface, here) {
            let next_index = surface.index_of(next);
            let step = surface.cells()[next_index].cost.max(0.0);
            let candidate = cost + step;
            if candidate < dist[next_index] {
                dist[next_index] = candidate;
                prev[next_index] = Some(here);
                heap.push(Frontier {
                    cost: candidate,
                    index: next_index,
                });
            }
        }
    }

    let mut cells = vec![to];
    let mut cursor = to;
    while let Some(p) = prev[surface.index_of(cursor)] {
        cells.push(p);
        cursor = p;
    }
    cells.reverse();
    (cells, dist[target])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::types::{Bounds, GridCell, LatticeSpec};

    /// Builds a surface directly from a row-major cost table.
    fn grid(costs: &[&[f64]]) -> CostSurface {
        let rows = costs.len();
        let cols = costs[0].len();
        let step = 0.01;
        let bounds = Bounds::new(0.0, 0.0, step * (rows - 1) as f64, step * (cols - 1) as f64);
        let mut cells = Vec::new();
        for (row, line) in costs.iter().enumerate() {
            for (col, &cost) in line.iter().enumerate() {
                cells.push(GridCell {
                    coord: GridCoord { row, col },
                    location: LatLng::new(row as f64 * step, col as f64 * step),
                    cost,
                });
            }
        }
        CostSurface {
            bounds,
            lattice: LatticeSpec {
                rows,
                cols,
                lat_step: step,
                lng_step: step,
            },
            cells,
        }
    }

    fn at(row: usize, col: usize) -> LatLng {
        LatLng::new(row as f64 * 0.01, col as f64 * 0.01)
    }

    #[test]
    fn test_same_endpoint_is_single_cell() {
        let surface = grid(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let paths = derive_paths(&surface, &[(at(1, 1), at(1, 1))]).unwrap();
        assert_eq!(paths[0].cells, vec![GridCoord { row: 1, col: 1 }]);
        assert_eq!(paths[0].total_cost, 0.0);
    }

    #[test]
    fn test_straight_line_cost() {
        let surface = grid(&[&[1.0, 2.0, 3.0]]);
        let paths = derive_paths(&surface, &[(at(0, 0), at(0, 2))]).unwrap();
        assert_eq!(paths[0].len(), 3);
        assert!((paths[0].total_cost - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_routes_around_expensive_cell() {
        let surface = grid(&[
            &[1.0, 100.0, 1.0],
            &[1.0, 1.0, 1.0],
        ]);
        let paths = derive_paths(&surface, &[(at(0, 0), at(0, 2))]).unwrap();
        let path = &paths[0];
        assert!(!path.cells.contains(&GridCoord { row: 0, col: 1 }));
        // down, right, right, up
        assert!((path.total_cost - 4.0).abs() < 1e-12);
        assert_eq!(path.cells.first(), Some(&GridCoord { row: 0, col: 0 }));
        assert_eq!(path.cells.last(), Some(&GridCoord { row: 0, col: 2 }));
    }

    #[test]
    fn test_path_steps_are_adjacent() {
        let surface = grid(&[
            &[5.0, 1.0, 7.0, 2.0],
            &[1.0, 9.0, 1.0, 3.0],
            &[2.0, 1.0, 1.0, 8.0],
        ]);
        let paths = derive_paths(&surface, &[(at(0, 0), at(2, 3))]).unwrap();
        for pair in paths[0].cells.windows(2) {
            let dr = pair[0].row.abs_diff(pair[1].row);
            let dc = pair[0].col.abs_diff(pair[1].col);
            assert_eq!(dr + dc, 1);
        }
    }

    #[test]
    fn test_negative_costs_are_floored() {
        let surface = grid(&[&[0.0, -5.0, 2.0]]);
        let paths = derive_paths(&surface, &[(at(0, 0), at(0, 2))]).unwrap();
        assert!((paths[0].total_cost - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_endpoint_snaps_to_nearest_cell() {
        let surface = grid(&[&[1.0, 1.0, 1.0]]);
        let near_middle = LatLng::new(0.0, 0.0104);
        let paths = derive_paths(&surface, &[(at(0, 0), near_middle)]).unwrap();
        assert_eq!(paths[0].cells.last(), Some(&GridCoord { row: 0, col: 1 }));
        assert_eq!(paths[0].end, near_middle);
    }

    #[test]
    fn test_outside_bounds_rejected() {
        let surface = grid(&[&[1.0, 1.0]]);
        let outside = LatLng::new(5.0, 5.0);
        let result = derive_paths(&surface, &[(at(0, 0), outside)]);
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_multiple_pairs_keep_order() {
        let surface = grid(&[&[1.0, 2.0, 3.0]]);
        let paths = derive_paths(&surface, &[(at(0, 0), at(0, 1)), (at(0, 2), at(0, 0))]).unwrap();
        assert_eq!(paths.len(), 2);
        assert!((paths[0].total_cost - 2.0).abs() < 1e-12);
        assert!((paths[1].total_cost - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_waypoints_follow_cells() {
        let surface = grid(&[&[1.0, 2.0]]);
        let paths = derive_paths(&surface, &[(at(0, 0), at(0, 1))]).unwrap();
        assert_eq!(paths[0].waypoints(&surface), vec![at(0, 0), at(0, 1)]);
    }
}
