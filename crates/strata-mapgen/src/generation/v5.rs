use strata_geom::{MAX_MAP_GENERATION_LIMIT, V3i};
use strata_nodes::Node;
use strata_noise::{NoiseMap, noise_perlin_2d, noise_perlin_3d};

use crate::config::V5Config;
use crate::generation::layers::StoneLayers;
use crate::job::GenerationJob;
use crate::mapgen::MapgenCommon;

/// Steepness factor from the factor noise: small values are floored, values past 1 are
/// boosted.
#[inline]
fn ground_factor(factor: f32) -> f32 {
    let f = 0.55 + factor;
    if f < 0.01 {
        0.01
    } else if f >= 1.0 {
        f * 1.6
    } else {
        f
    }
}

/// Overhang-heavy 3D density terrain.
pub struct V5Gen {
    cfg: V5Config,
    seed: i32,
    noise_factor: NoiseMap,
    noise_height: NoiseMap,
    noise_ground: NoiseMap,
}

impl V5Gen {
    pub fn new(cfg: &V5Config, seed: i32, csize: V3i) -> Self {
        let (sx, sy, sz) = (csize.x as usize, csize.y as usize + 2, csize.z as usize);
        Self {
            seed,
            noise_factor: NoiseMap::new_2d(cfg.np_factor.clone(), seed, sx, sz),
            noise_height: NoiseMap::new_2d(cfg.np_height.clone(), seed, sx, sz),
            noise_ground: NoiseMap::new_3d(cfg.np_ground.clone(), seed, sx, sy, sz),
            cfg: cfg.clone(),
        }
    }

    pub fn config(&self) -> &V5Config {
        &self.cfg
    }

    /// Fills unknown cells of the chunk plus skirt, taking solid cells from the stone
    /// layers. Returns the highest stone y.
    pub fn generate_base_terrain(
        &mut self,
        common: &MapgenCommon,
        layers: &mut StoneLayers,
        job: &mut GenerationJob,
    ) -> i32 {
        let nmin = job.node_min();
        let nmax = job.node_max();
        let (x0, y0, z0) = (nmin.x as f32, nmin.y as f32, nmin.z as f32);
        self.noise_factor.perlin_map_2d(x0, z0, None);
        self.noise_height.perlin_map_2d(x0, z0, None);
        self.noise_ground.perlin_map_3d(x0, y0 - 1.0, z0, None);
        layers.prepare(nmin, nmax);

        let n_water = Node::new(common.ids.water_source);
        let water_level = common.water_level;
        let area = *job.vm.area();
        let sx = (nmax.x - nmin.x + 1) as usize;
        let factor = self.noise_factor.result();
        let height = self.noise_height.result();
        let ground = self.noise_ground.result();

        let mut stone_surface_max_y = -MAX_MAP_GENERATION_LIMIT;
        let mut index3d = 0usize;
        for z in nmin.z..=nmax.z {
            for y in nmin.y - 1..=nmax.y + 1 {
                let mut vi = area.index(V3i::new(nmin.x, y, z));
                for xi in 0..sx {
                    let i = index3d;
                    let cell = vi;
                    index3d += 1;
                    vi += 1;
                    if !job.vm.node_at(cell).is_ignore() {
                        continue;
                    }
                    let j = (z - nmin.z) as usize * sx + xi;
                    let f = ground_factor(factor[j]);
                    let h = height[j];
                    if ground[i] * f < y as f32 - h {
                        job.vm.set_node_at(cell, if y <= water_level { n_water } else { Node::AIR });
                    } else {
                        job.vm.set_node_at(cell, layers.get(i));
                        stone_surface_max_y = stone_surface_max_y.max(y);
                    }
                }
            }
        }
        stone_surface_max_y
    }

    /// Lowest suitable spawn y of column (`x`, `z`) searching down from well above the
    /// expected surface, or `MAX_MAP_GENERATION_LIMIT` when the column is unsuitable.
    pub fn ground_level_at_point(&self, water_level: i32, x: i32, z: i32) -> i32 {
        let (fx, fz) = (x as f32, z as f32);
        let f = ground_factor(noise_perlin_2d(&self.cfg.np_factor, fx, fz, self.seed));
        let h = noise_perlin_2d(&self.cfg.np_height, fx, fz, self.seed);

        let max_spawn_y = (self.cfg.np_height.offset as i32).max(water_level + 16);
        for y in (water_level..=max_spawn_y + 128).rev() {
            let n_ground = noise_perlin_3d(&self.cfg.np_ground, fx, y as f32, fz, self.seed);
            if n_ground * f > y as f32 - h {
                if y < water_level || y > max_spawn_y {
                    return MAX_MAP_GENERATION_LIMIT;
                }
                return y + 2;
            }
        }
        MAX_MAP_GENERATION_LIMIT
    }
}
