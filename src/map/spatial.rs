use std::collections::HashMap;

/// Uniform grid over region bounding boxes for hit-test candidate lookup.
/// Each region is inserted into every cell its box overlaps, so a query never
/// misses a region; false positives are removed by the exact polygon test.
pub struct FeatureGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f64,
}

impl FeatureGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            cell_size,
        }
    }

    #[inline(always)]
    fn to_cell(&self, x: f64, y: f64) -> (i32, i32) {
        let cx = (x / self.cell_size).floor() as i32;
        let cy = (y / self.cell_size).floor() as i32;
        (cx, cy)
    }

    /// Build from bounding boxes `(min_x, min_y, max_x, max_y)`, indexed by position
    pub fn build(bboxes: impl Iterator<Item = (f64, f64, f64, f64)>, cell_size: f64) -> Self {
        let mut grid = Self::new(cell_size);
        for (idx, (min_x, min_y, max_x, max_y)) in bboxes.enumerate() {
            if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
                continue;
            }
            let min_cell = grid.to_cell(min_x, min_y);
            let max_cell = grid.to_cell(max_x, max_y);
            for y in min_cell.1..=max_cell.1 {
                for x in min_cell.0..=max_cell.0 {
                    grid.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }
        grid
    }

    /// Append indices for the given bounds into results vec.
    /// May contain duplicates; caller should dedup after all queries.
    pub fn query_into(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64, results: &mut Vec<usize>) {
        let min_cell = self.to_cell(min_x, min_y);
        let max_cell = self.to_cell(max_x, max_y);
        for y in min_cell.1..=max_cell.1 {
            for x in min_cell.0..=max_cell.0 {
                if let Some(indices) = self.cells.get(&(x, y)) {
                    results.extend_from_slice(indices);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
