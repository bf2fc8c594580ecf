//! Square, row-major terrain grids: heights, splat weights, and detail densities.

/// A square grid of `resolution × resolution` values stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    resolution: usize,
    cells: Vec<T>,
}

impl<T: Copy + Default> Grid<T> {
    /// Create a grid with every cell set to `T::default()`.
    pub fn new(resolution: usize) -> Self {
        Self::filled(resolution, T::default())
    }

    /// Create a grid with every cell set to `value`.
    pub fn filled(resolution: usize, value: T) -> Self {
        Self {
            resolution,
            cells: vec![value; resolution * resolution],
        }
    }

    /// Side length in cells.
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Read cell `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x` or `y` is `>= resolution`.
    pub fn get(&self, x: usize, y: usize) -> T {
        self.cells[self.index(x, y)]
    }

    /// Write cell `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x` or `y` is `>= resolution`.
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.cells[idx] = value;
    }

    /// Set every cell to `value`.
    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }

    /// Mutable access to row `y`.
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        let start = y * self.resolution;
        &mut self.cells[start..start + self.resolution]
    }

    /// All cells, row-major.
    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }

    /// Overwrite this grid with `other` without reallocating.
    ///
    /// # Panics
    ///
    /// Panics if the resolutions differ; grids never change size after creation.
    pub fn copy_from(&mut self, other: &Self) {
        assert_eq!(
            self.resolution, other.resolution,
            "grid resolution is fixed after creation"
        );
        self.cells.copy_from_slice(&other.cells);
    }

    fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.resolution && y < self.resolution,
            "cell ({x}, {y}) outside {0}x{0} grid",
            self.resolution
        );
        y * self.resolution + x
    }
}

/// Normalized terrain heights in `[0, 1]`.
pub type HeightGrid = Grid<f32>;

/// Per-cell texture layer weights (`resolution × resolution × layers`).
#[derive(Clone, Debug, PartialEq)]
pub struct SplatGrid {
    resolution: usize,
    layers: usize,
    weights: Vec<f32>,
}

impl SplatGrid {
    /// Create a splat grid with layer 0 fully weighted in every cell.
    pub fn new(resolution: usize, layers: usize) -> Self {
        let mut weights = vec![0.0; resolution * resolution * layers];
        if layers > 0 {
            for cell in weights.chunks_exact_mut(layers) {
                cell[0] = 1.0;
            }
        }
        Self {
            resolution,
            layers,
            weights,
        }
    }

    /// Side length in cells.
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Number of texture layers.
    pub fn layer_count(&self) -> usize {
        self.layers
    }

    /// Weight of `layer` at `(x, y)`.
    pub fn get(&self, x: usize, y: usize, layer: usize) -> f32 {
        self.cell(x, y)[layer]
    }

    /// Set the weight of `layer` at `(x, y)`.
    pub fn set(&mut self, x: usize, y: usize, layer: usize, weight: f32) {
        self.cell_mut(x, y)[layer] = weight;
    }

    /// Weight `layer` at 1.0 and every other layer at 0.0.
    pub fn set_one_hot(&mut self, x: usize, y: usize, layer: usize) {
        let cell = self.cell_mut(x, y);
        cell.fill(0.0);
        cell[layer] = 1.0;
    }

    /// All layer weights of one cell.
    pub fn cell(&self, x: usize, y: usize) -> &[f32] {
        let start = self.offset(x, y);
        &self.weights[start..start + self.layers]
    }

    /// Mutable layer weights of one cell.
    pub fn cell_mut(&mut self, x: usize, y: usize) -> &mut [f32] {
        let start = self.offset(x, y);
        &mut self.weights[start..start + self.layers]
    }

    /// Index of the highest-weighted layer at `(x, y)`; ties resolve to the lowest index.
    pub fn dominant_layer(&self, x: usize, y: usize) -> usize {
        let mut best = 0;
        let mut best_weight = f32::NEG_INFINITY;
        for (layer, &w) in self.cell(x, y).iter().enumerate() {
            if w > best_weight {
                best = layer;
                best_weight = w;
            }
        }
        best
    }

    /// Overwrite this grid with `other`.
    ///
    /// # Panics
    ///
    /// Panics if the shapes differ.
    pub fn copy_from(&mut self, other: &Self) {
        assert!(
            self.resolution == other.resolution && self.layers == other.layers,
            "splat grid shape is fixed after creation"
        );
        self.weights.copy_from_slice(&other.weights);
    }

    fn offset(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.resolution && y < self.resolution,
            "cell ({x}, {y}) outside {0}x{0} splat grid",
            self.resolution
        );
        (y * self.resolution + x) * self.layers
    }
}

/// One integer density grid per vegetation detail layer.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailGrids {
    resolution: usize,
    layers: Vec<Grid<u32>>,
}

impl DetailGrids {
    /// Create `count` zeroed detail layers.
    pub fn new(resolution: usize, count: usize) -> Self {
        Self {
            resolution,
            layers: (0..count).map(|_| Grid::new(resolution)).collect(),
        }
    }

    /// Side length in cells.
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Number of detail layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Borrow one layer.
    pub fn layer(&self, layer: usize) -> &Grid<u32> {
        &self.layers[layer]
    }

    /// Mutably borrow one layer.
    pub fn layer_mut(&mut self, layer: usize) -> &mut Grid<u32> {
        &mut self.layers[layer]
    }

    /// Density of `layer` at `(x, y)`.
    pub fn get(&self, layer: usize, x: usize, y: usize) -> u32 {
        self.layers[layer].get(x, y)
    }

    /// Set the density of `layer` at `(x, y)`.
    pub fn set(&mut self, layer: usize, x: usize, y: usize, value: u32) {
        self.layers[layer].set(x, y, value);
    }

    /// Zero every layer.
    pub fn clear(&mut self) {
        for layer in &mut self.layers {
            layer.fill(0);
        }
    }

    /// Sum of every density value across all layers.
    pub fn total(&self) -> u64 {
        self.layers
            .iter()
            .flat_map(|l| l.as_slice().iter())
            .map(|&v| v as u64)
            .sum()
    }

    /// Overwrite these grids with `other`.
    ///
    /// # Panics
    ///
    /// Panics if the layer counts or resolutions differ.
    pub fn copy_from(&mut self, other: &Self) {
        assert_eq!(
            self.layers.len(),
            other.layers.len(),
            "detail layer count is fixed after creation"
        );
        for (dst, src) in self.layers.iter_mut().zip(&other.layers) {
            dst.copy_from(src);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_get_set() {
        let mut grid: Grid<f32> = Grid::new(4);
        grid.set(3, 1, 0.75);
        assert_eq!(grid.get(3, 1), 0.75);
        assert_eq!(grid.as_slice()[4 + 3], 0.75, "row-major layout");
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_grid_out_of_bounds_panics() {
        let grid: Grid<u32> = Grid::new(2);
        let _ = grid.get(2, 0);
    }

    #[test]
    fn test_splat_defaults_to_first_layer() {
        let splat = SplatGrid::new(3, 4);
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(splat.cell(x, y), &[1.0, 0.0, 0.0, 0.0]);
                assert_eq!(splat.dominant_layer(x, y), 0);
            }
        }
    }

    #[test]
    fn test_splat_one_hot() {
        let mut splat = SplatGrid::new(2, 3);
        splat.set_one_hot(1, 1, 2);
        assert_eq!(splat.cell(1, 1), &[0.0, 0.0, 1.0]);
        assert_eq!(splat.dominant_layer(1, 1), 2);
        assert_eq!(splat.cell(0, 0), &[1.0, 0.0, 0.0], "other cells untouched");
    }

    #[test]
    fn test_detail_clear_and_total() {
        let mut detail = DetailGrids::new(4, 2);
        detail.set(0, 1, 1, 3);
        detail.set(1, 2, 3, 4);
        assert_eq!(detail.total(), 7);
        detail.clear();
        assert_eq!(detail.total(), 0);
    }

    #[test]
    fn test_copy_from_restores_values() {
        let original: Grid<f32> = Grid::filled(3, 0.25);
        let mut working = original.clone();
        working.set(0, 0, 0.9);
        working.copy_from(&original);
        assert_eq!(working, original);
    }
}
