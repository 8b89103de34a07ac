//! Integer-lattice hash noise and point samplers.

use crate::params::NoiseParams;

const NOISE_MAGIC_X: i32 = 1619;
const NOISE_MAGIC_Y: i32 = 31337;
const NOISE_MAGIC_Z: i32 = 52591;
const NOISE_MAGIC_SEED: i32 = 1013;

#[inline]
fn scramble(n: i32) -> f32 {
    let mut n = (n as u32) & 0x7fff_ffff;
    n ^= n >> 13;
    n = n
        .wrapping_mul(n.wrapping_mul(n).wrapping_mul(60493).wrapping_add(19_990_303))
        .wrapping_add(1_376_312_589)
        & 0x7fff_ffff;
    1.0 - (n as i32) as f32 / 1_073_741_824.0
}

/// Hash value in [-1, 1] at an integer 2D lattice point.
#[inline]
pub fn noise2d(x: i32, y: i32, seed: i32) -> f32 {
    scramble(
        NOISE_MAGIC_X
            .wrapping_mul(x)
            .wrapping_add(NOISE_MAGIC_Y.wrapping_mul(y))
            .wrapping_add(NOISE_MAGIC_SEED.wrapping_mul(seed)),
    )
}

/// Hash value in [-1, 1] at an integer 3D lattice point.
#[inline]
pub fn noise3d(x: i32, y: i32, z: i32, seed: i32) -> f32 {
    scramble(
        NOISE_MAGIC_X
            .wrapping_mul(x)
            .wrapping_add(NOISE_MAGIC_Y.wrapping_mul(y))
            .wrapping_add(NOISE_MAGIC_Z.wrapping_mul(z))
            .wrapping_add(NOISE_MAGIC_SEED.wrapping_mul(seed)),
    )
}

#[inline]
pub(crate) fn ease_curve(t: f32) -> f32 {
    t * t * t * (t * (6.0 * t - 15.0) + 10.0)
}

#[inline]
pub(crate) fn lerp(v0: f32, v1: f32, t: f32) -> f32 {
    v0 + (v1 - v0) * t
}

#[inline]
fn bilerp_raw(v00: f32, v10: f32, v01: f32, v11: f32, tx: f32, ty: f32) -> f32 {
    let u = lerp(v00, v10, tx);
    let v = lerp(v01, v11, tx);
    lerp(u, v, ty)
}

#[allow(clippy::too_many_arguments)]
#[inline]
pub(crate) fn bilerp(v00: f32, v10: f32, v01: f32, v11: f32, x: f32, y: f32, eased: bool) -> f32 {
    if eased {
        bilerp_raw(v00, v10, v01, v11, ease_curve(x), ease_curve(y))
    } else {
        bilerp_raw(v00, v10, v01, v11, x, y)
    }
}

#[inline]
pub(crate) fn trilerp(v: [f32; 8], x: f32, y: f32, z: f32, eased: bool) -> f32 {
    // v = [v000, v100, v010, v110, v001, v101, v011, v111]
    let (tx, ty, tz) = if eased {
        (ease_curve(x), ease_curve(y), ease_curve(z))
    } else {
        (x, y, z)
    };
    let u = bilerp_raw(v[0], v[1], v[2], v[3], tx, ty);
    let w = bilerp_raw(v[4], v[5], v[6], v[7], tx, ty);
    lerp(u, w, tz)
}

/// Interpolated lattice noise at a continuous 2D position.
pub fn noise2d_gradient(x: f32, y: f32, seed: i32, eased: bool) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let (xl, yl) = (x - x0, y - y0);
    let (x0, y0) = (x0 as i32, y0 as i32);
    let v00 = noise2d(x0, y0, seed);
    let v10 = noise2d(x0.wrapping_add(1), y0, seed);
    let v01 = noise2d(x0, y0.wrapping_add(1), seed);
    let v11 = noise2d(x0.wrapping_add(1), y0.wrapping_add(1), seed);
    bilerp(v00, v10, v01, v11, xl, yl, eased)
}

/// Interpolated lattice noise at a continuous 3D position.
pub fn noise3d_gradient(x: f32, y: f32, z: f32, seed: i32, eased: bool) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let z0 = z.floor();
    let (xl, yl, zl) = (x - x0, y - y0, z - z0);
    let (x0, y0, z0) = (x0 as i32, y0 as i32, z0 as i32);
    let (x1, y1, z1) = (x0.wrapping_add(1), y0.wrapping_add(1), z0.wrapping_add(1));
    let v = [
        noise3d(x0, y0, z0, seed),
        noise3d(x1, y0, z0, seed),
        noise3d(x0, y1, z0, seed),
        noise3d(x1, y1, z0, seed),
        noise3d(x0, y0, z1, seed),
        noise3d(x1, y0, z1, seed),
        noise3d(x0, y1, z1, seed),
        noise3d(x1, y1, z1, seed),
    ];
    trilerp(v, xl, yl, zl, eased)
}

/// Fractal sum of `np.octaves` octaves at a single 2D point.
pub fn noise_perlin_2d(np: &NoiseParams, x: f32, y: f32, seed: i32) -> f32 {
    let far = np.far_factors(&[x, y]);
    let x = x / (np.spread.x * far.spread);
    let y = y / (np.spread.y * far.spread);
    let seed = seed.wrapping_add(np.seed);
    let eased = np.eased();

    let mut a = 0.0f32;
    let mut f = 1.0f32;
    let mut g = 1.0f32;
    for i in 0..i32::from(np.octaves) {
        let mut v = noise2d_gradient(x * f, y * f, seed.wrapping_add(i), eased);
        if np.absvalue() {
            v = v.abs();
        }
        a += g * v;
        f *= np.lacunarity * far.lacunarity;
        g *= np.persist * far.persist;
    }
    np.offset + a * np.scale * far.scale
}

/// Fractal sum of `np.octaves` octaves at a single 3D point.
pub fn noise_perlin_3d(np: &NoiseParams, x: f32, y: f32, z: f32, seed: i32) -> f32 {
    let far = np.far_factors(&[x, y, z]);
    let x = x / (np.spread.x * far.spread);
    let y = y / (np.spread.y * far.spread);
    let z = z / (np.spread.z * far.spread);
    let seed = seed.wrapping_add(np.seed);
    let eased = np.eased();

    let mut a = 0.0f32;
    let mut f = 1.0f32;
    let mut g = 1.0f32;
    for i in 0..i32::from(np.octaves) {
        let mut v = noise3d_gradient(x * f, y * f, z * f, seed.wrapping_add(i), eased);
        if np.absvalue() {
            v = v.abs();
        }
        a += g * v;
        f *= np.lacunarity * far.lacunarity;
        g *= np.persist * far.persist;
    }
    np.offset + a * np.scale * far.scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_values_stay_in_unit_range() {
        for x in -20..20 {
            for y in -20..20 {
                let v = noise2d(x * 977, y * 131, 42);
                assert!((-1.0..=1.0).contains(&v), "{v}");
                let w = noise3d(x, y, x ^ y, -7);
                assert!((-1.0..=1.0).contains(&w), "{w}");
            }
        }
    }

    #[test]
    fn gradient_hits_lattice_values_at_integers() {
        for x in -5..5 {
            for y in -5..5 {
                let g = noise2d_gradient(x as f32, y as f32, 9, false);
                assert_eq!(g, noise2d(x, y, 9));
                let e = noise2d_gradient(x as f32, y as f32, 9, true);
                assert_eq!(e, noise2d(x, y, 9));
            }
        }
    }

    #[test]
    fn ease_curve_endpoints() {
        assert_eq!(ease_curve(0.0), 0.0);
        assert!((ease_curve(1.0) - 1.0).abs() < 1e-6);
        assert!((ease_curve(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn extreme_coordinates_do_not_overflow() {
        let v = noise3d(i32::MAX, i32::MIN, i32::MAX, i32::MIN);
        assert!(v.is_finite());
    }
}
