//! Biome map: a spatial index of biome cells answering "which biome(s), with
//! what blend weight, at point P".

use std::sync::Arc;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::distance::{DistanceMetric, EuclideanDistance};
use super::{BiomeCatalog, BiomeDef, BiomeId};
use crate::error::GenerationError;

/// A Voronoi seed point and its biome type. Immutable once created.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeCell {
    center: DVec2,
    biome: BiomeId,
    index: usize,
}

impl BiomeCell {
    pub(crate) fn new(center: DVec2, biome: BiomeId, index: usize) -> Self {
        Self {
            center,
            biome,
            index,
        }
    }

    /// Seed point in world XZ.
    pub fn center(&self) -> DVec2 {
        self.center
    }

    /// Biome type assigned to the cell.
    pub fn biome(&self) -> BiomeId {
        self.biome
    }

    /// Position in the map's cell list.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Result of a two-biome blend query.
///
/// `primary_weight + secondary_weight == 1`. With a single cell the secondary
/// biome equals the primary and carries weight 0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeQuery {
    /// Biome of the nearest cell.
    pub primary: BiomeId,
    /// Blend weight of the primary biome, in `[0.5, 1]`.
    pub primary_weight: f64,
    /// Biome of the second-nearest cell.
    pub secondary: BiomeId,
    /// Blend weight of the secondary biome, in `[0, 0.5]`.
    pub secondary_weight: f64,
    /// Center of the nearest cell.
    pub nearest_center: DVec2,
    /// Metric distance to the nearest cell.
    pub distance: f64,
}

/// Quintic smoothstep `t³(t(6t − 15) + 10)`, C2-continuous on `[0, 1]`.
#[inline]
pub fn quintic_smoothstep(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Primary blend weight for the two nearest distances `dist1 <= dist2`.
///
/// Returns exactly 1.0 once the gap reaches `blend_width`.
pub fn primary_weight(dist1: f64, dist2: f64, blend_width: f64) -> f64 {
    let gap = dist2 - dist1;
    if blend_width <= 0.0 || gap >= blend_width {
        return 1.0;
    }
    let t = (gap / blend_width).clamp(0.0, 1.0);
    0.5 + 0.5 * quintic_smoothstep(t)
}

/// Append-only set of biome cells plus the catalog their types come from.
#[derive(Debug)]
pub struct BiomeMap {
    cells: Vec<BiomeCell>,
    catalog: Arc<BiomeCatalog>,
    blend_width: f64,
    metric: Box<dyn DistanceMetric>,
}

impl BiomeMap {
    /// Create an empty map using Euclidean distance.
    pub fn new(catalog: Arc<BiomeCatalog>, blend_width: f64) -> Self {
        Self {
            cells: Vec::new(),
            catalog,
            blend_width: blend_width.max(0.0),
            metric: Box::new(EuclideanDistance),
        }
    }

    /// Replace the distance metric.
    pub fn with_metric(mut self, metric: Box<dyn DistanceMetric>) -> Self {
        self.metric = metric;
        self
    }

    /// Append a cell, returning its index.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidConfig`] if `biome` is not in the catalog.
    pub fn push_cell(&mut self, center: DVec2, biome: BiomeId) -> Result<usize, GenerationError> {
        if self.catalog.try_get(biome).is_none() {
            return Err(GenerationError::InvalidConfig(format!(
                "biome {biome} is not registered"
            )));
        }
        let index = self.cells.len();
        self.cells.push(BiomeCell::new(center, biome, index));
        Ok(index)
    }

    /// All cells in insertion order.
    pub fn cells(&self) -> &[BiomeCell] {
        &self.cells
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if the map has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Width of the border band where two biomes blend.
    pub fn blend_width(&self) -> f64 {
        self.blend_width
    }

    /// Catalog the cell types belong to.
    pub fn catalog(&self) -> &BiomeCatalog {
        &self.catalog
    }

    /// Parameters of a biome type present in this map.
    pub fn params(&self, biome: BiomeId) -> &BiomeDef {
        self.catalog.get(biome)
    }

    /// Metric distance from `point` to `cell`.
    pub fn distance(&self, point: DVec2, cell: &BiomeCell) -> f64 {
        self.metric.distance(point, cell)
    }

    /// Nearest cell to `point`.
    ///
    /// # Panics
    ///
    /// Panics if the map is empty.
    pub fn nearest_cell(&self, point: DVec2) -> &BiomeCell {
        let (nearest, _) = self.two_nearest(point);
        &self.cells[nearest.0]
    }

    /// Biome of the nearest cell.
    ///
    /// # Panics
    ///
    /// Panics if the map is empty.
    pub fn biome_at(&self, point: DVec2) -> BiomeId {
        self.nearest_cell(point).biome
    }

    /// Two-biome blend at `point`.
    ///
    /// # Panics
    ///
    /// Panics if the map is empty.
    pub fn query(&self, point: DVec2) -> BiomeQuery {
        let ((i1, d1), second) = self.two_nearest(point);
        let nearest = &self.cells[i1];
        match second {
            None => BiomeQuery {
                primary: nearest.biome,
                primary_weight: 1.0,
                secondary: nearest.biome,
                secondary_weight: 0.0,
                nearest_center: nearest.center,
                distance: d1,
            },
            Some((i2, d2)) => {
                let w = primary_weight(d1, d2, self.blend_width);
                BiomeQuery {
                    primary: nearest.biome,
                    primary_weight: w,
                    secondary: self.cells[i2].biome,
                    secondary_weight: 1.0 - w,
                    nearest_center: nearest.center,
                    distance: d1,
                }
            }
        }
    }

    /// Half the gap between the nearest cell and the nearest cell of a
    /// different biome type. Infinite if only one type is present.
    ///
    /// # Panics
    ///
    /// Panics if the map is empty.
    pub fn distance_to_border(&self, point: DVec2) -> f64 {
        let nearest = self.nearest_cell(point);
        let d_own = self.distance(point, nearest);
        let d_other = self
            .cells
            .iter()
            .filter(|c| c.biome != nearest.biome)
            .map(|c| self.distance(point, c))
            .fold(f64::INFINITY, f64::min);
        if d_other.is_infinite() {
            return f64::INFINITY;
        }
        (d_other - d_own) * 0.5
    }

    /// Indices and distances of the nearest and second-nearest cells.
    fn two_nearest(&self, point: DVec2) -> ((usize, f64), Option<(usize, f64)>) {
        assert!(
            !self.cells.is_empty(),
            "BiomeMap queried before any cell was added"
        );
        let mut first = (0, f64::INFINITY);
        let mut second: Option<(usize, f64)> = None;
        for cell in &self.cells {
            let d = self.distance(point, cell);
            if d < first.1 {
                if first.1.is_finite() {
                    second = Some(first);
                }
                first = (cell.index, d);
            } else if second.is_none_or(|(_, d2)| d < d2) {
                second = Some((cell.index, d));
            }
        }
        (first, second)
    }
}
