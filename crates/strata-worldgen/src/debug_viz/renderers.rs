//! Overlay renderers: heightmap, biome map, splat weights, and vegetation density.

use super::image::DebugImage;
use crate::biome::BiomeMap;
use crate::bounds::Bounds;
use crate::grid::{DetailGrids, HeightGrid, SplatGrid};

/// Color-coded elevation: lowland green → hills brown → rock grey → snow.
pub fn render_heightmap(heights: &HeightGrid) -> DebugImage {
    let side = heights.resolution() as u32;
    DebugImage::from_fn(side, |x, y| height_to_color(heights.get(x as usize, y as usize) as f64))
}

/// Map a normalized height `[0, 1]` to an RGB color.
pub fn height_to_color(normalized: f64) -> [u8; 3] {
    let h = normalized.clamp(0.0, 1.0);
    if h < 0.35 {
        // Lowlands: green
        let t = h / 0.35;
        [(40.0 + t * 60.0) as u8, (150.0 + t * 20.0) as u8, (40.0 + t * 10.0) as u8]
    } else if h < 0.6 {
        // Hills: brown
        let t = (h - 0.35) / 0.25;
        [(100.0 + t * 40.0) as u8, (170.0 - t * 80.0) as u8, (50.0 + t * 10.0) as u8]
    } else if h < 0.85 {
        // Rock: grey
        let t = (h - 0.6) / 0.25;
        let base = 110.0 + t * 50.0;
        [base as u8, (base - 10.0) as u8, (base - 15.0) as u8]
    } else {
        let t = (h - 0.85) / 0.15;
        let base = 200.0 + t * 55.0;
        [base as u8, base as u8, base as u8]
    }
}

/// Biome colors sampled at grid resolution, mixing the two nearest biomes by
/// blend weight so the border band is visible.
///
/// # Panics
///
/// Panics if the map is empty.
pub fn render_biome_map(map: &BiomeMap, bounds: Bounds, resolution: usize) -> DebugImage {
    DebugImage::from_fn(resolution as u32, |x, y| {
        let point = bounds.grid_to_world(x as usize, y as usize, resolution);
        let q = map.query(point);
        let primary = map.params(q.primary).debug_color;
        let secondary = map.params(q.secondary).debug_color;
        mix(primary, secondary, q.secondary_weight)
    })
}

/// Splat weights blended through `palette`, one color per layer.
///
/// Layers past the end of the palette render as mid grey.
pub fn render_splat(splat: &SplatGrid, palette: &[[u8; 3]]) -> DebugImage {
    DebugImage::from_fn(splat.resolution() as u32, |x, y| {
        let mut rgb = [0.0_f64; 3];
        for (layer, &w) in splat.cell(x as usize, y as usize).iter().enumerate() {
            let color = palette.get(layer).copied().unwrap_or([128, 128, 128]);
            for (channel, c) in rgb.iter_mut().zip(color) {
                *channel += c as f64 * w as f64;
            }
        }
        rgb.map(|c| c.round().clamp(0.0, 255.0) as u8)
    })
}

/// Summed vegetation density across all detail layers, as green intensity.
pub fn render_detail(detail: &DetailGrids) -> DebugImage {
    let res = detail.resolution();
    let sum_at = |x: usize, y: usize| -> u64 {
        (0..detail.layer_count())
            .map(|l| detail.get(l, x, y) as u64)
            .sum()
    };
    let peak = (0..res)
        .flat_map(|y| (0..res).map(move |x| (x, y)))
        .map(|(x, y)| sum_at(x, y))
        .max()
        .unwrap_or(0)
        .max(1);
    DebugImage::from_fn(res as u32, |x, y| {
        let t = sum_at(x as usize, y as usize) as f64 / peak as f64;
        [(30.0 * (1.0 - t)) as u8, (40.0 + t * 200.0) as u8, (30.0 * (1.0 - t)) as u8]
    })
}

fn mix(a: [u8; 3], b: [u8; 3], t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    [0, 1, 2].map(|i| (a[i] as f64 + (b[i] as f64 - a[i] as f64) * t).round() as u8)
}
