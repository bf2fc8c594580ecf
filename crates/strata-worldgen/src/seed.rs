//! Deterministic seeded generation utilities.
//!
//! Derives independent RNG streams from a run seed and a salt, provides
//! position-keyed random draws for per-cell grid scans, and wraps the few
//! transcendental functions the generator needs in `libm` so results do not
//! depend on the platform libc.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ---------------------------------------------------------------------------
// Seed derivation
// ---------------------------------------------------------------------------

/// Derive a sub-seed from a run seed and a salt.
///
/// Uses SipHash (via std's `DefaultHasher`) so neighbouring salts produce
/// well-separated seeds.
pub fn derive_seed(seed: u64, salt: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    salt.hash(&mut hasher);
    hasher.finish()
}

/// Stable salt for a name, e.g. a biome name keying its height noise.
pub fn name_salt(name: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    hasher.finish()
}

/// Derive a deterministic RNG stream for `(seed, salt)`.
pub fn stream_rng(seed: u64, salt: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_seed(seed, salt))
}

/// Position-keyed uniform draw in `[0, 1)`.
///
/// The value depends only on `(seed, salt, x, y)`, never on how many draws
/// preceded it, so grid scans may visit cells in any order.
pub fn cell_random(seed: u64, salt: u64, x: usize, y: usize) -> f64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    salt.hash(&mut hasher);
    x.hash(&mut hasher);
    y.hash(&mut hasher);
    // Top 53 bits fill the f64 mantissa exactly.
    (hasher.finish() >> 11) as f64 / (1_u64 << 53) as f64
}

/// Resolve a configured seed: non-zero seeds are returned unchanged, zero
/// draws a fresh non-zero seed from the thread RNG.
pub fn resolve_seed(seed: u64) -> u64 {
    if seed != 0 {
        return seed;
    }
    let mut rng = rand::rng();
    loop {
        let candidate: u64 = rng.random();
        if candidate != 0 {
            return candidate;
        }
    }
}

// ---------------------------------------------------------------------------
// Deterministic math (libm)
// ---------------------------------------------------------------------------

/// Deterministic sqrt using libm.
#[inline]
pub fn det_sqrt(x: f64) -> f64 {
    libm::sqrt(x)
}

/// Deterministic atan using libm.
#[inline]
pub fn det_atan(x: f64) -> f64 {
    libm::atan(x)
}

/// Deterministic sine using libm.
#[inline]
pub fn det_sin(x: f64) -> f64 {
    libm::sin(x)
}

/// Deterministic cosine using libm.
#[inline]
pub fn det_cos(x: f64) -> f64 {
    libm::cos(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    #[test]
    fn test_derive_seed_deterministic() {
        assert_eq!(
            derive_seed(999, 7),
            derive_seed(999, 7),
            "Same inputs must produce same derived seed"
        );
    }

    #[test]
    fn test_derive_seed_different_salts() {
        assert_ne!(
            derive_seed(42, 1),
            derive_seed(42, 2),
            "Adjacent salts should produce different seeds"
        );
    }

    #[test]
    fn test_stream_rng_deterministic() {
        let mut rng_a = stream_rng(42, 3);
        let mut rng_b = stream_rng(42, 3);
        for _ in 0..1000 {
            assert_eq!(
                rng_a.next_u64(),
                rng_b.next_u64(),
                "ChaCha8Rng sequences must match for same seed"
            );
        }
    }

    #[test]
    fn test_cell_random_range_and_keying() {
        let mut distinct = std::collections::HashSet::new();
        for y in 0..16 {
            for x in 0..16 {
                let v = cell_random(5, 11, x, y);
                assert!((0.0..1.0).contains(&v), "draw {v} out of [0, 1)");
                assert_eq!(v, cell_random(5, 11, x, y), "draw must be position-keyed");
                distinct.insert(v.to_bits());
            }
        }
        assert!(distinct.len() > 250, "draws should rarely collide");
    }

    #[test]
    fn test_resolve_seed_keeps_explicit_seed() {
        assert_eq!(resolve_seed(1234), 1234);
        assert_ne!(resolve_seed(0), 0, "Resolved seed must never be zero");
    }

    #[test]
    fn test_deterministic_math_functions() {
        let x = 1.234_567_890_123_4;
        assert_eq!(det_sqrt(x), det_sqrt(x), "det_sqrt must be deterministic");
        assert_eq!(det_atan(x), det_atan(x), "det_atan must be deterministic");
        assert!((det_sin(x).powi(2) + det_cos(x).powi(2) - 1.0).abs() < 1e-12);
    }
}
