//! A 2D debug image represented as a flat array of RGBA pixels.

/// A 2D debug image, stored as row-major RGBA pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebugImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Pixel data in row-major RGBA format. Length = `width * height * 4`.
    pub pixels: Vec<u8>,
}

impl DebugImage {
    /// Create a new black (all-zero) image with the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        }
    }

    /// Square opaque image with each pixel computed from its coordinates.
    pub fn from_fn(side: u32, mut color: impl FnMut(u32, u32) -> [u8; 3]) -> Self {
        let mut image = Self::new(side, side);
        for y in 0..side {
            for x in 0..side {
                let [r, g, b] = color(x, y);
                image.set_pixel(x, y, r, g, b, 255);
            }
        }
        image
    }

    /// Set a single pixel's RGBA value.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn set_pixel(&mut self, x: u32, y: u32, r: u8, g: u8, b: u8, a: u8) {
        let idx = self.offset(x, y);
        self.pixels[idx..idx + 4].copy_from_slice(&[r, g, b, a]);
    }

    /// Get a pixel's RGBA value.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn get_pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let idx = self.offset(x, y);
        (
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        )
    }

    /// Returns `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Count the number of unique colors (ignoring alpha) in the image.
    pub fn unique_color_count(&self) -> usize {
        let mut colors = hashbrown::HashSet::new();
        for chunk in self.pixels.chunks_exact(4) {
            colors.insert((chunk[0], chunk[1], chunk[2]));
        }
        colors.len()
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} image",
            self.width,
            self.height
        );
        ((y * self.width + x) * 4) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_image_correct_dimensions() {
        let image = DebugImage::new(256, 128);
        assert_eq!(image.dimensions(), (256, 128));
        assert_eq!(image.pixels.len(), 256 * 128 * 4);
    }

    #[test]
    fn test_get_pixel_roundtrip() {
        let mut image = DebugImage::new(8, 8);
        image.set_pixel(2, 3, 10, 20, 30, 40);
        assert_eq!(image.get_pixel(2, 3), (10, 20, 30, 40));
    }

    #[test]
    fn test_from_fn_is_opaque() {
        let image = DebugImage::from_fn(4, |x, y| [x as u8, y as u8, 0]);
        assert_eq!(image.get_pixel(3, 1), (3, 1, 0, 255));
        assert_eq!(image.unique_color_count(), 16);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_out_of_range_pixel_panics() {
        let image = DebugImage::new(2, 2);
        image.get_pixel(2, 0);
    }
}
