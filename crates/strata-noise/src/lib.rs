//! Lattice value noise, fractal sums over sample grids, and the seeded RNGs used by map generation.
#![forbid(unsafe_code)]

pub mod lattice;
pub mod map;
pub mod params;
pub mod random;

pub use lattice::{
    noise_perlin_2d, noise_perlin_3d, noise2d, noise2d_gradient, noise3d, noise3d_gradient,
};
pub use map::NoiseMap;
pub use params::{NoiseFlags, NoiseParams};
pub use random::{PcgRandom, PseudoRandom, block_seed, block_seed2};

/// Ridge shaping used by noise-intersection caves: peaks at 0 and falls to 0 at |v| >= 1.
#[inline]
pub fn contour(v: f32) -> f32 {
    let v = v.abs();
    if v >= 1.0 { 0.0 } else { 1.0 - v }
}
