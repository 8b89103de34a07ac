use strata_geom::{MAX_MAP_GENERATION_LIMIT, V3i};
use strata_nodes::Node;
use strata_noise::{NoiseMap, noise_perlin_2d};

use crate::config::FlatConfig;
use crate::job::GenerationJob;
use crate::mapgen::MapgenCommon;

/// Constant ground level, optionally dented by lakes and raised by hills.
pub struct FlatGen {
    cfg: FlatConfig,
    seed: i32,
    noise_terrain: NoiseMap,
}

impl FlatGen {
    pub fn new(cfg: &FlatConfig, seed: i32, csize: V3i) -> Self {
        Self {
            seed,
            noise_terrain: NoiseMap::new_2d(cfg.np_terrain.clone(), seed, csize.x as usize, csize.z as usize),
            cfg: cfg.clone(),
        }
    }

    pub fn config(&self) -> &FlatConfig {
        &self.cfg
    }

    fn uses_noise(&self) -> bool {
        self.cfg.lakes || self.cfg.hills
    }

    /// Stone level for a terrain noise value.
    pub fn stone_level(&self, n_terrain: f32) -> i32 {
        let c = &self.cfg;
        if c.lakes && n_terrain < c.lake_threshold {
            c.ground_level - ((c.lake_threshold - n_terrain) * c.lake_steepness) as i32
        } else if c.hills && n_terrain > c.hill_threshold {
            c.ground_level + ((n_terrain - c.hill_threshold) * c.hill_steepness) as i32
        } else {
            c.ground_level
        }
    }

    pub fn generate_terrain(&mut self, common: &MapgenCommon, job: &mut GenerationJob) -> i32 {
        let nmin = job.node_min();
        let nmax = job.node_max();
        if self.uses_noise() {
            self.noise_terrain.perlin_map_2d(nmin.x as f32, nmin.z as f32, None);
        }
        let n_stone = Node::new(common.ids.stone);
        let n_water = Node::new(common.ids.water_source);
        let water_level = common.water_level;
        let area = *job.vm.area();
        let ystride = area.y_stride();

        let mut stone_surface_max_y = -MAX_MAP_GENERATION_LIMIT;
        let mut index = 0usize;
        for z in nmin.z..=nmax.z {
            for x in nmin.x..=nmax.x {
                let n_terrain = if self.uses_noise() { self.noise_terrain.result()[index] } else { 0.0 };
                let stone_level = self.stone_level(n_terrain);
                index += 1;

                let mut vi = area.index(V3i::new(x, nmin.y - 1, z));
                for y in nmin.y - 1..=nmax.y + 1 {
                    if job.vm.node_at(vi).is_ignore() {
                        if y <= stone_level {
                            job.vm.set_node_at(vi, n_stone);
                            stone_surface_max_y = stone_surface_max_y.max(y);
                        } else if y <= water_level {
                            job.vm.set_node_at(vi, n_water);
                        } else {
                            job.vm.set_node_at(vi, Node::AIR);
                        }
                    }
                    vi += ystride;
                }
            }
        }
        stone_surface_max_y
    }

    /// Spawn height for column (`x`, `z`); worlds whose ground lies below water are
    /// unsuitable everywhere.
    pub fn ground_level_at_point(&self, water_level: i32, x: i32, z: i32) -> i32 {
        if self.cfg.ground_level < water_level {
            return MAX_MAP_GENERATION_LIMIT;
        }
        let n_terrain = if self.uses_noise() {
            noise_perlin_2d(&self.cfg.np_terrain, x as f32, z as f32, self.seed)
        } else {
            0.0
        };
        self.stone_level(n_terrain) + 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lakes_and_hills_follow_thresholds() {
        let cfg = FlatConfig {
            lakes: true,
            hills: true,
            ..FlatConfig::default()
        };
        let g = FlatGen::new(&cfg, 0, V3i::splat(16));
        assert_eq!(g.stone_level(0.0), 8);
        // one unit past each threshold
        assert_eq!(g.stone_level(-1.45), 8 - 48);
        assert_eq!(g.stone_level(1.45), 8 + 64);
    }

    #[test]
    fn flat_without_features_ignores_noise() {
        let g = FlatGen::new(&FlatConfig::default(), 0, V3i::splat(16));
        assert_eq!(g.stone_level(-5.0), 8);
        assert_eq!(g.ground_level_at_point(1, 100, -100), 10);
    }
}
