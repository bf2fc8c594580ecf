//! Generation debug visualization: 2D previews of phase output.
//!
//! Provides [`DebugImage`] and renderers for heightmaps, biome maps, splat
//! weights, and vegetation density. In artist mode each grid phase leaves a
//! [`DebugOverlay`] on the context for the host to display or save.

mod image;
mod renderers;

pub use self::image::DebugImage;
pub use renderers::{height_to_color, render_biome_map, render_detail, render_heightmap, render_splat};

/// A rendered preview of one phase's output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebugOverlay {
    /// Short name of what the image shows, e.g. `"heightmap"`.
    pub label: &'static str,
    /// The rendered preview.
    pub image: DebugImage,
}

impl DebugOverlay {
    /// Pair a label with an image.
    pub fn new(label: &'static str, image: DebugImage) -> Self {
        Self { label, image }
    }
}
