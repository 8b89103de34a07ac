//! Fractal noise evaluated over a regular sample grid.
//!
//! Each octave fills a lattice buffer covering the grid once and then walks the grid,
//! carrying the surrounding lattice corners along instead of re-hashing per sample.

use crate::lattice::{bilerp, noise2d, noise3d, trilerp};
use crate::params::NoiseParams;

/// Reusable noise grid of `sx * sy` (2D) or `sx * sy * sz` (3D) samples.
///
/// Results are laid out x-fastest: `index = (z * sy + y) * sx + x`.
#[derive(Clone, Debug)]
pub struct NoiseMap {
    np: NoiseParams,
    seed: i32,
    sx: usize,
    sy: usize,
    sz: usize,
    noise_buf: Vec<f32>,
    gradient_buf: Vec<f32>,
    persist_buf: Vec<f32>,
    result: Vec<f32>,
}

impl NoiseMap {
    pub fn new_2d(np: NoiseParams, seed: i32, sx: usize, sy: usize) -> Self {
        Self::new_3d(np, seed, sx, sy, 1)
    }

    pub fn new_3d(np: NoiseParams, seed: i32, sx: usize, sy: usize, sz: usize) -> Self {
        let sx = sx.max(1);
        let sy = sy.max(1);
        let sz = sz.max(1);
        let total = sx * sy * sz;
        let mut map = Self {
            np,
            seed,
            sx,
            sy,
            sz,
            noise_buf: Vec::new(),
            gradient_buf: vec![0.0; total],
            persist_buf: Vec::new(),
            result: vec![0.0; total],
        };
        map.reserve_lattice();
        map
    }

    /// Sizes the lattice buffer for the finest octave so later fills rarely reallocate.
    fn reserve_lattice(&mut self) {
        let octaves = i32::from(self.np.octaves.max(1)) - 1;
        let ofactor = self.np.lacunarity.abs().max(1.0).powi(octaves);
        let points = |n: usize, spread: f32| -> usize {
            let s = spread.abs().max(f32::EPSILON);
            ((n as f32 * ofactor / s).ceil() as usize).saturating_add(3)
        };
        let nlx = points(self.sx, self.np.spread.x);
        let nly = points(self.sy, self.np.spread.y);
        let nlz = if self.sz > 1 {
            points(self.sz, self.np.spread.z)
        } else {
            1
        };
        self.noise_buf
            .reserve(nlx.saturating_mul(nly).saturating_mul(nlz).min(1 << 22));
    }

    pub fn params(&self) -> &NoiseParams {
        &self.np
    }

    pub fn seed(&self) -> i32 {
        self.seed
    }

    pub fn size(&self) -> (usize, usize, usize) {
        (self.sx, self.sy, self.sz)
    }

    pub fn result(&self) -> &[f32] {
        &self.result
    }

    pub fn result_mut(&mut self) -> &mut [f32] {
        &mut self.result
    }

    #[inline]
    pub fn at_2d(&self, x: usize, y: usize) -> f32 {
        self.result[y * self.sx + x]
    }

    #[inline]
    pub fn at_3d(&self, x: usize, y: usize, z: usize) -> f32 {
        self.result[(z * self.sy + y) * self.sx + x]
    }

    /// Fills the result with fractal noise sampled at integer steps starting at (`x`, `y`).
    ///
    /// With a persistence map, octave `i` is weighted by the product of the map values
    /// over the previous octaves instead of `persist^i`.
    pub fn perlin_map_2d(&mut self, x: f32, y: f32, persistence_map: Option<&[f32]>) -> &[f32] {
        let bufsize = self.sx * self.sy;
        let far = self.np.far_factors(&[x, y]);
        let spread_x = self.np.spread.x * far.spread;
        let spread_y = self.np.spread.y * far.spread;
        let x = x / spread_x;
        let y = y / spread_y;

        self.result[..bufsize].fill(0.0);
        let use_pmap = self.prepare_persistence(persistence_map, bufsize);

        let mut f = 1.0f32;
        let mut g = 1.0f32;
        for oct in 0..i32::from(self.np.octaves) {
            let seed = self.seed.wrapping_add(self.np.seed).wrapping_add(oct);
            self.gradient_map_2d(x * f, y * f, f / spread_x, f / spread_y, seed);
            self.update_results(g, persistence_map.filter(|_| use_pmap), bufsize);
            f *= self.np.lacunarity * far.lacunarity;
            g *= self.np.persist * far.persist;
        }

        self.apply_offset_scale(far.scale, bufsize);
        &self.result[..bufsize]
    }

    /// 3D counterpart of [`NoiseMap::perlin_map_2d`].
    pub fn perlin_map_3d(
        &mut self,
        x: f32,
        y: f32,
        z: f32,
        persistence_map: Option<&[f32]>,
    ) -> &[f32] {
        let bufsize = self.sx * self.sy * self.sz;
        let far = self.np.far_factors(&[x, y, z]);
        let spread_x = self.np.spread.x * far.spread;
        let spread_y = self.np.spread.y * far.spread;
        let spread_z = self.np.spread.z * far.spread;
        let x = x / spread_x;
        let y = y / spread_y;
        let z = z / spread_z;

        self.result[..bufsize].fill(0.0);
        let use_pmap = self.prepare_persistence(persistence_map, bufsize);

        let mut f = 1.0f32;
        let mut g = 1.0f32;
        for oct in 0..i32::from(self.np.octaves) {
            let seed = self.seed.wrapping_add(self.np.seed).wrapping_add(oct);
            self.gradient_map_3d(
                x * f,
                y * f,
                z * f,
                f / spread_x,
                f / spread_y,
                f / spread_z,
                seed,
            );
            self.update_results(g, persistence_map.filter(|_| use_pmap), bufsize);
            f *= self.np.lacunarity * far.lacunarity;
            g *= self.np.persist * far.persist;
        }

        self.apply_offset_scale(far.scale, bufsize);
        &self.result[..bufsize]
    }

    fn prepare_persistence(&mut self, persistence_map: Option<&[f32]>, bufsize: usize) -> bool {
        match persistence_map {
            Some(pmap) => {
                assert!(
                    pmap.len() >= bufsize,
                    "persistence map has {} entries, grid needs {}",
                    pmap.len(),
                    bufsize
                );
                self.persist_buf.clear();
                self.persist_buf.resize(bufsize, 1.0);
                true
            }
            None => false,
        }
    }

    fn update_results(&mut self, g: f32, persistence_map: Option<&[f32]>, bufsize: usize) {
        let absvalue = self.np.absvalue();
        let grad = &self.gradient_buf[..bufsize];
        match persistence_map {
            Some(pmap) => {
                for i in 0..bufsize {
                    let v = if absvalue { grad[i].abs() } else { grad[i] };
                    self.result[i] += self.persist_buf[i] * v;
                    self.persist_buf[i] *= pmap[i];
                }
            }
            None => {
                for (r, &v) in self.result[..bufsize].iter_mut().zip(grad) {
                    *r += g * if absvalue { v.abs() } else { v };
                }
            }
        }
    }

    fn apply_offset_scale(&mut self, far_scale: f32, bufsize: usize) {
        let scale = self.np.scale * far_scale;
        let offset = self.np.offset;
        if offset.abs() > 1e-5 || (scale - 1.0).abs() > 1e-5 {
            for r in &mut self.result[..bufsize] {
                *r = *r * scale + offset;
            }
        }
    }

    fn gradient_map_2d(&mut self, x: f32, y: f32, step_x: f32, step_y: f32, seed: i32) {
        let eased = self.np.eased();
        let (sx, sy) = (self.sx, self.sy);

        let x0f = x.floor();
        let y0f = y.floor();
        let orig_u = x - x0f;
        let mut v = y - y0f;
        let (x0, y0) = (x0f as i32, y0f as i32);

        // The walk accumulates steps, so float drift can carry it one lattice point past
        // the closed-form end.
        let nlx = (orig_u + sx as f32 * step_x) as usize + 3;
        let nly = (v + sy as f32 * step_y) as usize + 3;
        self.noise_buf.clear();
        for j in 0..nly as i32 {
            for i in 0..nlx as i32 {
                self.noise_buf
                    .push(noise2d(x0.wrapping_add(i), y0.wrapping_add(j), seed));
            }
        }

        let buf = &self.noise_buf;
        let at = |lx: usize, ly: usize| buf[ly * nlx + lx];
        let mut index = 0usize;
        let mut noisey = 0usize;
        for _ in 0..sy {
            let mut v00 = at(0, noisey);
            let mut v10 = at(1, noisey);
            let mut v01 = at(0, noisey + 1);
            let mut v11 = at(1, noisey + 1);

            let mut u = orig_u;
            let mut noisex = 0usize;
            for _ in 0..sx {
                self.gradient_buf[index] = bilerp(v00, v10, v01, v11, u, v, eased);
                index += 1;
                u += step_x;
                while u >= 1.0 {
                    u -= 1.0;
                    noisex += 1;
                    v00 = v10;
                    v01 = v11;
                    v10 = at(noisex + 1, noisey);
                    v11 = at(noisex + 1, noisey + 1);
                }
            }

            v += step_y;
            while v >= 1.0 {
                v -= 1.0;
                noisey += 1;
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn gradient_map_3d(
        &mut self,
        x: f32,
        y: f32,
        z: f32,
        step_x: f32,
        step_y: f32,
        step_z: f32,
        seed: i32,
    ) {
        let eased = self.np.eased();
        let (sx, sy, sz) = (self.sx, self.sy, self.sz);

        let x0f = x.floor();
        let y0f = y.floor();
        let z0f = z.floor();
        let orig_u = x - x0f;
        let orig_v = y - y0f;
        let mut w = z - z0f;
        let (x0, y0, z0) = (x0f as i32, y0f as i32, z0f as i32);

        let nlx = (orig_u + sx as f32 * step_x) as usize + 3;
        let nly = (orig_v + sy as f32 * step_y) as usize + 3;
        let nlz = (w + sz as f32 * step_z) as usize + 3;
        self.noise_buf.clear();
        for k in 0..nlz as i32 {
            for j in 0..nly as i32 {
                for i in 0..nlx as i32 {
                    self.noise_buf.push(noise3d(
                        x0.wrapping_add(i),
                        y0.wrapping_add(j),
                        z0.wrapping_add(k),
                        seed,
                    ));
                }
            }
        }

        let buf = &self.noise_buf;
        let at = |lx: usize, ly: usize, lz: usize| buf[(lz * nly + ly) * nlx + lx];
        let mut index = 0usize;
        let mut noisez = 0usize;
        for _ in 0..sz {
            let mut v = orig_v;
            let mut noisey = 0usize;
            for _ in 0..sy {
                // [v000, v100, v010, v110, v001, v101, v011, v111]
                let mut c = [
                    at(0, noisey, noisez),
                    at(1, noisey, noisez),
                    at(0, noisey + 1, noisez),
                    at(1, noisey + 1, noisez),
                    at(0, noisey, noisez + 1),
                    at(1, noisey, noisez + 1),
                    at(0, noisey + 1, noisez + 1),
                    at(1, noisey + 1, noisez + 1),
                ];

                let mut u = orig_u;
                let mut noisex = 0usize;
                for _ in 0..sx {
                    self.gradient_buf[index] = trilerp(c, u, v, w, eased);
                    index += 1;
                    u += step_x;
                    while u >= 1.0 {
                        u -= 1.0;
                        noisex += 1;
                        c[0] = c[1];
                        c[2] = c[3];
                        c[4] = c[5];
                        c[6] = c[7];
                        c[1] = at(noisex + 1, noisey, noisez);
                        c[3] = at(noisex + 1, noisey + 1, noisez);
                        c[5] = at(noisex + 1, noisey, noisez + 1);
                        c[7] = at(noisex + 1, noisey + 1, noisez + 1);
                    }
                }

                v += step_y;
                while v >= 1.0 {
                    v -= 1.0;
                    noisey += 1;
                }
            }
            w += step_z;
            while w >= 1.0 {
                w -= 1.0;
                noisez += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_geom::Vec3;

    #[test]
    fn constant_single_octave_map_matches_offset() {
        let np = NoiseParams::new(5.0, 0.0, Vec3::new(10.0, 10.0, 10.0), 1, 1, 0.5, 2.0);
        let mut m = NoiseMap::new_2d(np, 0, 4, 4);
        for v in m.perlin_map_2d(0.0, 0.0, None) {
            assert_eq!(*v, 5.0);
        }
    }

    #[test]
    fn persistence_map_of_persist_matches_plain_map() {
        let np = NoiseParams::new(0.0, 1.0, Vec3::new(50.0, 50.0, 50.0), 77, 4, 0.5, 2.0);
        let mut plain = NoiseMap::new_2d(np.clone(), 3, 8, 8);
        let mut modulated = NoiseMap::new_2d(np, 3, 8, 8);
        let pmap = vec![0.5f32; 64];
        let a = plain.perlin_map_2d(16.0, -32.0, None).to_vec();
        let b = modulated.perlin_map_2d(16.0, -32.0, Some(&pmap)).to_vec();
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-5, "{x} vs {y}");
        }
    }
}
