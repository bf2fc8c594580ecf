//! The grid-bearing terrain resource generation writes into, plus point sampling.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::error::GenerationError;
use crate::grid::{DetailGrids, HeightGrid, SplatGrid};
use crate::seed::{det_atan, det_sqrt};

/// Shape and world placement of a terrain resource.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainLayout {
    /// World XZ position of grid cell `(0, 0)`.
    pub origin: DVec2,
    /// World XZ extent covered by the grids.
    pub size: DVec2,
    /// World height represented by a normalized height of 1.0.
    pub height_scale: f64,
    /// Side length of every grid, in cells.
    pub resolution: usize,
    /// Number of splat (texture) layers.
    pub splat_layers: usize,
    /// Number of detail (vegetation) layers.
    pub detail_layers: usize,
}

impl TerrainLayout {
    /// World-space rectangle covered by the grids.
    pub fn bounds(&self) -> Bounds {
        Bounds::from_origin_size(self.origin, self.size)
    }

    /// Check the layout can host a generation run.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.resolution < 2 {
            return Err(GenerationError::InvalidConfig(format!(
                "terrain resolution must be at least 2, got {}",
                self.resolution
            )));
        }
        if self.size.x <= 0.0 || self.size.y <= 0.0 {
            return Err(GenerationError::InvalidConfig(format!(
                "terrain size must be positive, got {:?}",
                self.size
            )));
        }
        if self.height_scale <= 0.0 {
            return Err(GenerationError::InvalidConfig(format!(
                "height scale must be positive, got {}",
                self.height_scale
            )));
        }
        if self.splat_layers == 0 {
            return Err(GenerationError::InvalidConfig(
                "terrain needs at least one splat layer".into(),
            ));
        }
        Ok(())
    }
}

/// A terrain owned by the host that generation reads from and writes back to.
///
/// Generation snapshots every grid through the `read_*` methods once per run
/// and publishes results through the `write_*` methods after each phase.
pub trait TerrainResource {
    /// Shape and placement of the grids.
    fn layout(&self) -> TerrainLayout;
    /// Copy of the height grid.
    fn read_heights(&self) -> HeightGrid;
    /// Replace the height grid.
    fn write_heights(&mut self, heights: &HeightGrid);
    /// Copy of the splat grid.
    fn read_splat(&self) -> SplatGrid;
    /// Replace the splat grid.
    fn write_splat(&mut self, splat: &SplatGrid);
    /// Copy of the detail grids.
    fn read_detail(&self) -> DetailGrids;
    /// Replace the detail grids.
    fn write_detail(&mut self, detail: &DetailGrids);
}

/// In-memory [`TerrainResource`].
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainData {
    layout: TerrainLayout,
    heights: HeightGrid,
    splat: SplatGrid,
    detail: DetailGrids,
}

impl TerrainData {
    /// Flat terrain at height 0, fully painted with splat layer 0, no detail.
    pub fn new(layout: TerrainLayout) -> Self {
        Self {
            layout,
            heights: HeightGrid::new(layout.resolution),
            splat: SplatGrid::new(layout.resolution, layout.splat_layers),
            detail: DetailGrids::new(layout.resolution, layout.detail_layers),
        }
    }

    /// Height grid.
    pub fn heights(&self) -> &HeightGrid {
        &self.heights
    }

    /// Mutable height grid, for hosts seeding terrain before generation.
    pub fn heights_mut(&mut self) -> &mut HeightGrid {
        &mut self.heights
    }

    /// Splat grid.
    pub fn splat(&self) -> &SplatGrid {
        &self.splat
    }

    /// Detail grids.
    pub fn detail(&self) -> &DetailGrids {
        &self.detail
    }
}

impl TerrainResource for TerrainData {
    fn layout(&self) -> TerrainLayout {
        self.layout
    }

    fn read_heights(&self) -> HeightGrid {
        self.heights.clone()
    }

    fn write_heights(&mut self, heights: &HeightGrid) {
        self.heights.copy_from(heights);
    }

    fn read_splat(&self) -> SplatGrid {
        self.splat.clone()
    }

    fn write_splat(&mut self, splat: &SplatGrid) {
        self.splat.copy_from(splat);
    }

    fn read_detail(&self) -> DetailGrids {
        self.detail.clone()
    }

    fn write_detail(&mut self, detail: &DetailGrids) {
        self.detail.copy_from(detail);
    }
}

/// Read-only point sampling over a height and splat grid mapped onto `bounds`.
#[derive(Clone, Copy, Debug)]
pub struct TerrainSampler<'a> {
    bounds: Bounds,
    heights: &'a HeightGrid,
    splat: &'a SplatGrid,
    height_scale: f64,
}

impl<'a> TerrainSampler<'a> {
    /// Create a sampler. `bounds` is the world rectangle the grids span.
    pub fn new(
        bounds: Bounds,
        heights: &'a HeightGrid,
        splat: &'a SplatGrid,
        height_scale: f64,
    ) -> Self {
        Self {
            bounds,
            heights,
            splat,
            height_scale,
        }
    }

    /// World rectangle the grids span.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Bilinearly interpolated normalized height at a world point.
    ///
    /// Points outside the bounds clamp to the nearest edge cell.
    pub fn height_at(&self, point: DVec2) -> f64 {
        let res = self.heights.resolution();
        let max = (res - 1) as f64;
        let g = self.bounds.world_to_grid(point, res).clamp(DVec2::ZERO, DVec2::splat(max));
        let x0 = g.x.floor() as usize;
        let y0 = g.y.floor() as usize;
        let x1 = (x0 + 1).min(res - 1);
        let y1 = (y0 + 1).min(res - 1);
        let fx = g.x - x0 as f64;
        let fy = g.y - y0 as f64;

        let h00 = self.heights.get(x0, y0) as f64;
        let h10 = self.heights.get(x1, y0) as f64;
        let h01 = self.heights.get(x0, y1) as f64;
        let h11 = self.heights.get(x1, y1) as f64;

        let top = h00 + (h10 - h00) * fx;
        let bottom = h01 + (h11 - h01) * fx;
        top + (bottom - top) * fy
    }

    /// Height at a world point in world units.
    pub fn world_height_at(&self, point: DVec2) -> f64 {
        self.height_at(point) * self.height_scale
    }

    /// Terrain slope at a world point, in degrees from horizontal.
    ///
    /// Central differences one grid cell apart, in world units.
    pub fn slope_at(&self, point: DVec2) -> f64 {
        let res = self.heights.resolution();
        let size = self.bounds.size();
        if res < 2 || size.x <= 0.0 || size.y <= 0.0 {
            return 0.0;
        }
        let step = size / (res - 1) as f64;
        let dx = DVec2::new(step.x, 0.0);
        let dz = DVec2::new(0.0, step.y);

        let gx = (self.world_height_at(point + dx) - self.world_height_at(point - dx)) / (2.0 * step.x);
        let gz = (self.world_height_at(point + dz) - self.world_height_at(point - dz)) / (2.0 * step.y);
        det_atan(det_sqrt(gx * gx + gz * gz)).to_degrees()
    }

    /// Highest-weighted splat layer in the grid cell nearest to `point`.
    pub fn dominant_layer_at(&self, point: DVec2) -> usize {
        let res = self.splat.resolution();
        let max = (res - 1) as f64;
        let g = self.bounds.world_to_grid(point, res).clamp(DVec2::ZERO, DVec2::splat(max));
        self.splat.dominant_layer(g.x.round() as usize, g.y.round() as usize)
    }
}
