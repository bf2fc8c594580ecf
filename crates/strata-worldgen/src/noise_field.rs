//! Deterministic value-noise field with optional fractal (fBm) layering.
//!
//! Raw noise is post-processed in a fixed order: normalize to `[0, 1]`,
//! optional power curve, optional invert, then amplitude scale.

use noise::{NoiseFn, Value};
use serde::{Deserialize, Serialize};

/// Octave layering mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoiseMode {
    /// One octave at the base frequency.
    Single,
    /// Fractal Brownian motion: `octaves` layers combined by persistence/lacunarity.
    #[default]
    Fractal,
}

/// Configuration for a [`NoiseField`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// Octave layering mode.
    pub mode: NoiseMode,
    /// Frequency of the first octave, in cycles per world unit.
    pub frequency: f64,
    /// Number of octaves in [`NoiseMode::Fractal`] mode.
    pub octaves: u32,
    /// Amplitude multiplier between successive octaves.
    pub persistence: f64,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
    /// Exponent applied after normalization; `None` leaves the curve linear.
    pub power: Option<f64>,
    /// Flip the normalized value (`1 - v`).
    pub invert: bool,
    /// Final scale applied to the processed value.
    pub amplitude: f64,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            mode: NoiseMode::Fractal,
            frequency: 0.01,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            power: None,
            invert: false,
            amplitude: 1.0,
        }
    }
}

/// A seeded 2D noise sampler.
///
/// Identical `(seed, settings, x, y)` always produce the identical value.
#[derive(Clone, Debug)]
pub struct NoiseField {
    noise: Value,
    seed: u64,
    settings: NoiseSettings,
}

impl NoiseField {
    /// Create a field with the given settings and seed.
    pub fn new(settings: NoiseSettings, seed: u64) -> Self {
        Self {
            noise: Value::new(fold_seed(seed)),
            seed,
            settings,
        }
    }

    /// Reseed the underlying noise. Sampling afterwards is as if the field
    /// had been constructed with `seed`.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
        self.noise = Value::new(fold_seed(seed));
    }

    /// The seed the field was built with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Current settings.
    pub fn settings(&self) -> &NoiseSettings {
        &self.settings
    }

    /// Unprocessed noise in roughly `[-1, 1]`.
    ///
    /// Fractal mode divides by the geometric amplitude sum so the range does
    /// not grow with the octave count.
    pub fn raw(&self, x: f64, y: f64) -> f64 {
        let s = &self.settings;
        match s.mode {
            NoiseMode::Single => self.noise.get([x * s.frequency, y * s.frequency]),
            NoiseMode::Fractal => {
                let mut total = 0.0;
                let mut norm = 0.0;
                let mut frequency = s.frequency;
                let mut amplitude = 1.0;
                for octave in 0..s.octaves.max(1) {
                    // Shift each octave so lattice points do not line up at the origin.
                    let shift = octave as f64 * 31.7;
                    total += self.noise.get([x * frequency + shift, y * frequency - shift]) * amplitude;
                    norm += amplitude;
                    frequency *= s.lacunarity;
                    amplitude *= s.persistence;
                }
                if norm > 0.0 { total / norm } else { 0.0 }
            }
        }
    }

    /// Sample the processed field at `(x, y)`.
    ///
    /// Returns a value in `[0, amplitude]`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let s = &self.settings;
        let mut v = ((self.raw(x, y) + 1.0) * 0.5).clamp(0.0, 1.0);
        if let Some(power) = s.power {
            v = v.powf(power);
        }
        if s.invert {
            v = 1.0 - v;
        }
        v * s.amplitude
    }
}

/// Fold a 64-bit seed into the 32 bits the `noise` crate accepts.
fn fold_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism_same_seed_same_coord() {
        let a = NoiseField::new(NoiseSettings::default(), 42);
        let b = NoiseField::new(NoiseSettings::default(), 42);
        for i in 0..100 {
            let x = i as f64 * 3.7;
            let y = i as f64 * -1.3;
            assert_eq!(
                a.sample(x, y).to_bits(),
                b.sample(x, y).to_bits(),
                "Same seed + same coord must be bit-identical"
            );
        }
    }

    #[test]
    fn test_set_seed_matches_fresh_field() {
        let mut field = NoiseField::new(NoiseSettings::default(), 1);
        field.set_seed(77);
        let fresh = NoiseField::new(NoiseSettings::default(), 77);
        assert_eq!(field.seed(), 77);
        assert_eq!(field.sample(12.5, 40.25), fresh.sample(12.5, 40.25));
    }

    #[test]
    fn test_different_seeds_produce_different_fields() {
        let a = NoiseField::new(NoiseSettings::default(), 1);
        let b = NoiseField::new(NoiseSettings::default(), 999);
        let differs = (0..64).any(|i| {
            let x = i as f64 * 13.3 + 0.5;
            (a.sample(x, x * 0.7) - b.sample(x, x * 0.7)).abs() > 1e-9
        });
        assert!(differs, "Different seeds should produce different fields");
    }

    #[test]
    fn test_sample_within_amplitude() {
        let settings = NoiseSettings {
            amplitude: 3.0,
            ..Default::default()
        };
        let field = NoiseField::new(settings, 5);
        for i in 0..50 {
            for j in 0..50 {
                let v = field.sample(i as f64 * 2.1, j as f64 * 1.9);
                assert!((0.0..=3.0).contains(&v), "sample {v} outside [0, 3]");
            }
        }
    }

    #[test]
    fn test_invert_mirrors_value() {
        let plain = NoiseField::new(NoiseSettings::default(), 8);
        let inverted = NoiseField::new(
            NoiseSettings {
                invert: true,
                ..Default::default()
            },
            8,
        );
        let (x, y) = (17.3, -4.4);
        assert!((plain.sample(x, y) + inverted.sample(x, y) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_power_curve_darkens_midtones() {
        let linear = NoiseField::new(NoiseSettings::default(), 3);
        let curved = NoiseField::new(
            NoiseSettings {
                power: Some(2.0),
                ..Default::default()
            },
            3,
        );
        let (x, y) = (55.5, 21.25);
        let l = linear.sample(x, y);
        assert!((curved.sample(x, y) - l * l).abs() < 1e-12);
    }

    #[test]
    fn test_single_mode_ignores_octaves() {
        let a = NoiseField::new(
            NoiseSettings {
                mode: NoiseMode::Single,
                octaves: 1,
                ..Default::default()
            },
            4,
        );
        let b = NoiseField::new(
            NoiseSettings {
                mode: NoiseMode::Single,
                octaves: 8,
                ..Default::default()
            },
            4,
        );
        assert_eq!(a.sample(9.0, 9.5), b.sample(9.0, 9.5));
    }
}
