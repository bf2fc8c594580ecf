//! Writing run results to disk: PNG previews, a 16-bit heightmap and the
//! spawn list.

use std::path::{Path, PathBuf};

use image::{ImageBuffer, Luma, RgbaImage};
use strata_config::OutputConfig;
use strata_worldgen::debug_viz::render_biome_map;
use strata_worldgen::{
    DebugImage, DebugOverlay, GenerationContext, HeightGrid, SpawnGroup, TerrainData,
};

use crate::error::CliError;

/// Heightmap file name.
pub const HEIGHTMAP_FILE: &str = "heightmap.png";
/// Biome preview file name.
pub const BIOME_FILE: &str = "biomes.png";
/// Spawn list file name.
pub const SPAWN_FILE: &str = "spawns.ron";

/// Write every output `config` enables and return the paths written.
pub fn write_outputs(
    config: &OutputConfig,
    ctx: &GenerationContext,
    terrain: &TerrainData,
) -> Result<Vec<PathBuf>, CliError> {
    let dir = config.directory.as_path();
    ensure_dir(dir)?;

    let mut written = Vec::new();
    if config.heightmap_png {
        written.push(write_heightmap(dir, terrain.heights())?);
    }
    if config.biome_png
        && let Some(map) = ctx.biome_map()
    {
        let image = render_biome_map(map, ctx.bounds(), ctx.resolution());
        written.push(write_image(&dir.join(BIOME_FILE), &image)?);
    }
    if config.spawn_list {
        written.push(write_spawn_list(dir, ctx.spawn_groups())?);
    }
    Ok(written)
}

/// Save an artist-mode overlay as `overlay_<index>_<label>.png`.
pub fn write_overlay(dir: &Path, index: usize, overlay: &DebugOverlay) -> Result<PathBuf, CliError> {
    ensure_dir(dir)?;
    write_image(
        &dir.join(format!("overlay_{index}_{}.png", overlay.label)),
        &overlay.image,
    )
}

/// Normalized heights as a 16-bit greyscale PNG, row 0 at the top.
pub fn write_heightmap(dir: &Path, heights: &HeightGrid) -> Result<PathBuf, CliError> {
    let side = heights.resolution() as u32;
    let samples: Vec<u16> = heights
        .as_slice()
        .iter()
        .map(|&h| (h.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16)
        .collect();
    let image: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_raw(side, side, samples)
        .ok_or(CliError::PixelBuffer {
            width: side,
            height: side,
        })?;
    let path = dir.join(HEIGHTMAP_FILE);
    image.save(&path)?;
    Ok(path)
}

/// Spawn groups as pretty RON.
pub fn write_spawn_list(dir: &Path, groups: &[SpawnGroup]) -> Result<PathBuf, CliError> {
    let serialized = ron::ser::to_string_pretty(groups, ron::ser::PrettyConfig::new())?;
    let path = dir.join(SPAWN_FILE);
    std::fs::write(&path, serialized).map_err(|source| CliError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn write_image(path: &Path, image: &DebugImage) -> Result<PathBuf, CliError> {
    let (width, height) = image.dimensions();
    let rgba = RgbaImage::from_raw(width, height, image.pixels.clone())
        .ok_or(CliError::PixelBuffer { width, height })?;
    rgba.save(path)?;
    Ok(path.to_path_buf())
}

fn ensure_dir(dir: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(dir).map_err(|source| CliError::Write {
        path: dir.to_path_buf(),
        source,
    })
}
