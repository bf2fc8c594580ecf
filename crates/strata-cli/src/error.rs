//! Top-level errors of the `strata` binary.

use std::path::PathBuf;

use strata_config::ConfigError;
use strata_worldgen::GenerationError;

/// Anything that aborts a CLI run.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The config could not be loaded or is not runnable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The pipeline rejected a request.
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// A phase ended in the failed state.
    #[error("phase `{phase}` failed: {error}")]
    PhaseFailed {
        /// Name of the failed phase.
        phase: &'static str,
        /// The phase's recorded error.
        error: String,
    },

    /// An output file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// File that was being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Encoding a PNG failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// A raw pixel buffer did not match its declared size.
    #[error("pixel buffer does not match a {width}x{height} image")]
    PixelBuffer {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
    },

    /// Spawn groups could not be serialized.
    #[error("failed to serialize spawn list: {0}")]
    Serialize(#[from] ron::Error),

    /// Reading commands or writing prompts failed.
    #[error("console I/O failed: {0}")]
    Console(#[source] std::io::Error),
}
