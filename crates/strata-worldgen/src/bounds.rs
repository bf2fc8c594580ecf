//! Axis-aligned rectangles on the world XZ plane and grid index mapping.

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in world XZ space. `x` maps to world X, `y` to world Z.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum corner (inclusive).
    pub min: DVec2,
    /// Maximum corner (inclusive).
    pub max: DVec2,
}

impl Bounds {
    /// Create bounds from two corners, ordering the components so `min <= max`.
    pub fn new(a: DVec2, b: DVec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create bounds from an origin corner and a size.
    pub fn from_origin_size(origin: DVec2, size: DVec2) -> Self {
        Self::new(origin, origin + size)
    }

    /// Extent along each axis.
    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    /// Surface area in square world units.
    pub fn area(&self) -> f64 {
        let size = self.size();
        size.x * size.y
    }

    /// Center point.
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Returns `true` if `point` lies inside the rectangle (edges included).
    pub fn contains(&self, point: DVec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Shrink symmetrically by `margin` on every side.
    ///
    /// The margin is clamped so the result never inverts; an over-large margin
    /// collapses the bounds onto the center point.
    pub fn shrink(&self, margin: f64) -> Self {
        let half = self.size() * 0.5;
        let m = DVec2::splat(margin.max(0.0)).min(half);
        Self {
            min: self.min + m,
            max: self.max - m,
        }
    }

    /// Map grid index `(x, y)` of a `resolution`-sized grid to world space.
    ///
    /// `world = min + (index / (resolution - 1)) * size`, so index 0 lands on
    /// `min` and index `resolution - 1` on `max`.
    pub fn grid_to_world(&self, x: usize, y: usize, resolution: usize) -> DVec2 {
        if resolution < 2 {
            return self.min;
        }
        let denom = (resolution - 1) as f64;
        self.min + DVec2::new(x as f64 / denom, y as f64 / denom) * self.size()
    }

    /// Map a world point to fractional grid coordinates (inverse of [`Self::grid_to_world`]).
    pub fn world_to_grid(&self, point: DVec2, resolution: usize) -> DVec2 {
        let size = self.size();
        if resolution < 2 || size.x <= 0.0 || size.y <= 0.0 {
            return DVec2::ZERO;
        }
        (point - self.min) / size * (resolution - 1) as f64
    }

    /// Draw a uniformly distributed point inside the bounds.
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> DVec2 {
        let x = if self.max.x > self.min.x {
            rng.random_range(self.min.x..self.max.x)
        } else {
            self.min.x
        };
        let y = if self.max.y > self.min.y {
            rng.random_range(self.min.y..self.max.y)
        } else {
            self.min.y
        };
        DVec2::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_new_orders_corners() {
        let b = Bounds::new(DVec2::new(10.0, -5.0), DVec2::new(0.0, 5.0));
        assert_eq!(b.min, DVec2::new(0.0, -5.0));
        assert_eq!(b.max, DVec2::new(10.0, 5.0));
        assert!((b.area() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_grid_to_world_covers_corners() {
        let b = Bounds::from_origin_size(DVec2::new(100.0, 200.0), DVec2::new(50.0, 50.0));
        assert_eq!(b.grid_to_world(0, 0, 11), DVec2::new(100.0, 200.0));
        assert_eq!(b.grid_to_world(10, 10, 11), DVec2::new(150.0, 250.0));
        assert_eq!(b.grid_to_world(5, 0, 11), DVec2::new(125.0, 200.0));
    }

    #[test]
    fn test_world_to_grid_inverts_mapping() {
        let b = Bounds::from_origin_size(DVec2::new(-20.0, 5.0), DVec2::new(64.0, 32.0));
        let world = b.grid_to_world(7, 3, 33);
        let grid = b.world_to_grid(world, 33);
        assert!((grid.x - 7.0).abs() < 1e-9, "x round-trip: {}", grid.x);
        assert!((grid.y - 3.0).abs() < 1e-9, "y round-trip: {}", grid.y);
    }

    #[test]
    fn test_shrink_never_inverts() {
        let b = Bounds::from_origin_size(DVec2::ZERO, DVec2::new(10.0, 10.0));
        let s = b.shrink(2.0);
        assert_eq!(s.min, DVec2::splat(2.0));
        assert_eq!(s.max, DVec2::splat(8.0));

        let collapsed = b.shrink(100.0);
        assert_eq!(collapsed.min, collapsed.max);
        assert_eq!(collapsed.center(), DVec2::splat(5.0));
    }

    #[test]
    fn test_random_point_inside() {
        let b = Bounds::from_origin_size(DVec2::new(3.0, 4.0), DVec2::new(7.0, 2.0));
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..1000 {
            let p = b.random_point(&mut rng);
            assert!(b.contains(p), "point {p:?} escaped {b:?}");
        }
    }
}
