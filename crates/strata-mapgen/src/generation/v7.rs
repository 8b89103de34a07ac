use strata_geom::{MAX_MAP_GENERATION_LIMIT, V3i};
use strata_nodes::{CONTENT_AIR, Node};
use strata_noise::{NoiseMap, NoiseParams, noise_perlin_2d, noise_perlin_3d};

use crate::config::V7Config;
use crate::generation::layers::StoneLayers;
use crate::job::GenerationJob;
use crate::mapgen::MapgenCommon;

/// River channels open where `|uwater * 2|` stays within this width.
const RIDGE_WIDTH: f32 = 0.3;
const MOUNTAIN_THRESHOLD: f32 = 0.6;

/// Blends the base and alternative height fields. `hselect` is clamped to [0, 1].
#[inline]
pub fn base_terrain_level(height_base: f32, height_alt: f32, hselect: f32) -> f32 {
    let hselect = hselect.clamp(0.0, 1.0);
    if height_alt > height_base {
        return height_alt;
    }
    height_base * hselect + height_alt * (1.0 - hselect)
}

#[inline]
fn mountain_solid(mnt_n: f32, mount_h: f32, y: i32) -> bool {
    // Only an exact zero is replaced; small and negative heights divide as-is.
    let mount_h = if mount_h == 0.0 { f32::MIN_POSITIVE } else { mount_h };
    mnt_n - y as f32 / mount_h >= MOUNTAIN_THRESHOLD
}

/// The primary terrain variant: blended 2D height fields, 3D mountains and river ridges.
pub struct V7Gen {
    cfg: V7Config,
    seed: i32,
    noise_terrain_base: NoiseMap,
    noise_terrain_alt: NoiseMap,
    noise_terrain_persist: NoiseMap,
    noise_height_select: NoiseMap,
    noise_mount_height: NoiseMap,
    noise_ridge_uwater: NoiseMap,
    noise_mountain: NoiseMap,
    noise_ridge: NoiseMap,
}

impl V7Gen {
    pub fn new(cfg: &V7Config, seed: i32, csize: V3i) -> Self {
        let (sx, sy, sz) = (csize.x as usize, csize.y as usize + 2, csize.z as usize);
        let map2 = |np: &NoiseParams| NoiseMap::new_2d(np.clone(), seed, sx, sz);
        let map3 = |np: &NoiseParams| NoiseMap::new_3d(np.clone(), seed, sx, sy, sz);
        Self {
            seed,
            noise_terrain_base: map2(&cfg.np_terrain_base),
            noise_terrain_alt: map2(&cfg.np_terrain_alt),
            noise_terrain_persist: map2(&cfg.np_terrain_persist),
            noise_height_select: map2(&cfg.np_height_select),
            noise_mount_height: map2(&cfg.np_mount_height),
            noise_ridge_uwater: map2(&cfg.np_ridge_uwater),
            noise_mountain: map3(&cfg.np_mountain),
            noise_ridge: map3(&cfg.np_ridge),
            cfg: cfg.clone(),
        }
    }

    pub fn config(&self) -> &V7Config {
        &self.cfg
    }

    /// Fills every noise map for the chunk at `nmin`. 3D maps start one node below.
    pub fn calculate_noise(&mut self, nmin: V3i) {
        let (x, y, z) = (nmin.x as f32, nmin.y as f32, nmin.z as f32);

        self.noise_height_select.perlin_map_2d(x, z, None);
        self.noise_terrain_persist.perlin_map_2d(x, z, None);
        for p in self.noise_terrain_persist.result_mut() {
            *p = p.clamp(0.4, 0.9);
        }
        let pmap = self.noise_terrain_persist.result();
        self.noise_terrain_base.perlin_map_2d(x, z, Some(pmap));
        self.noise_terrain_alt.perlin_map_2d(x, z, Some(pmap));

        if self.cfg.mountains {
            self.noise_mountain.perlin_map_3d(x, y - 1.0, z, None);
            self.noise_mount_height.perlin_map_2d(x, z, None);
        }
        if self.cfg.ridges {
            self.noise_ridge.perlin_map_3d(x, y - 1.0, z, None);
            self.noise_ridge_uwater.perlin_map_2d(x, z, None);
        }
    }

    /// Base terrain filled from the stone layers, then mountains and ridges. Returns the
    /// highest stone surface.
    pub fn generate_terrain(&mut self, common: &MapgenCommon, layers: &mut StoneLayers, job: &mut GenerationJob) -> i32 {
        self.calculate_noise(job.node_min());
        layers.prepare(job.node_min(), job.node_max());
        let mut ymax = self.generate_base_terrain(common, layers, job);
        if self.cfg.mountains {
            ymax = self.generate_mountain_terrain(common, job, ymax);
        }
        if self.cfg.ridges {
            self.generate_ridge_terrain(common, job);
        }
        ymax
    }

    fn base_terrain_level_from_map(&self, index: usize) -> f32 {
        base_terrain_level(
            self.noise_terrain_base.result()[index],
            self.noise_terrain_alt.result()[index],
            self.noise_height_select.result()[index],
        )
    }

    fn generate_base_terrain(&self, common: &MapgenCommon, layers: &StoneLayers, job: &mut GenerationJob) -> i32 {
        let nmin = job.node_min();
        let nmax = job.node_max();
        let n_water = Node::new(common.ids.water_source);
        let n_ice = Node::new(common.ids.ice);
        let water_level = common.water_level;
        let area = *job.vm.area();
        let ystride = area.y_stride();
        let sx = (nmax.x - nmin.x + 1) as usize;
        let zstride = sx * (nmax.y - nmin.y + 3) as usize;

        let mut stone_surface_max_y = -MAX_MAP_GENERATION_LIMIT;
        let mut index = 0usize;
        for z in nmin.z..=nmax.z {
            for x in nmin.x..=nmax.x {
                let mut index3d = (z - nmin.z) as usize * zstride + (x - nmin.x) as usize;
                let surface_y = self.base_terrain_level_from_map(index) as i32;
                job.heightmap[index] = surface_y;
                stone_surface_max_y = stone_surface_max_y.max(surface_y);
                let heat = common.column_heat(V3i::new(x, nmax.y, z));

                let mut vi = area.index(V3i::new(x, nmin.y - 1, z));
                for y in nmin.y - 1..=nmax.y + 1 {
                    if job.vm.node_at(vi).is_ignore() {
                        let n = if y <= surface_y {
                            layers.get(index3d)
                        } else if y <= water_level {
                            if heat < 0 && y > heat / 3 { n_ice } else { n_water }
                        } else {
                            Node::AIR
                        };
                        job.vm.set_node_at(vi, n);
                    }
                    vi += ystride;
                    index3d += sx;
                }
                index += 1;
            }
        }
        stone_surface_max_y
    }

    fn generate_mountain_terrain(&self, common: &MapgenCommon, job: &mut GenerationJob, mut ymax: i32) -> i32 {
        let nmin = job.node_min();
        let nmax = job.node_max();
        if nmax.y <= common.water_level {
            return ymax;
        }
        let n_stone = Node::new(common.ids.stone);
        let area = *job.vm.area();
        let sx = (nmax.x - nmin.x + 1) as usize;
        let mountain = self.noise_mountain.result();
        let mount_height = self.noise_mount_height.result();

        let mut index3d = 0usize;
        for z in nmin.z..=nmax.z {
            for y in nmin.y - 1..=nmax.y + 1 {
                let mut vi = area.index(V3i::new(nmin.x, y, z));
                let j0 = (z - nmin.z) as usize * sx;
                for xi in 0..sx {
                    let c = job.vm.node_at(vi).content;
                    if (c == CONTENT_AIR || c == common.ids.water_source)
                        && mountain_solid(mountain[index3d], mount_height[j0 + xi], y)
                    {
                        job.vm.set_node_at(vi, n_stone);
                        ymax = ymax.max(y);
                    }
                    vi += 1;
                    index3d += 1;
                }
            }
        }
        ymax
    }

    fn generate_ridge_terrain(&self, common: &MapgenCommon, job: &mut GenerationJob) {
        let nmin = job.node_min();
        let nmax = job.node_max();
        let water_level = common.water_level;
        let n_water = Node::new(common.ids.water_source);
        let n_ice = Node::new(common.ids.ice);
        let area = *job.vm.area();
        let sx = (nmax.x - nmin.x + 1) as usize;
        let persist = self.noise_terrain_persist.result();
        let uwater = self.noise_ridge_uwater.result();
        let ridge = self.noise_ridge.result();

        let mut index3d = 0usize;
        for z in nmin.z..=nmax.z {
            for y in nmin.y - 1..=nmax.y + 1 {
                let mut vi = area.index(V3i::new(nmin.x, y, z));
                for xi in 0..sx {
                    let j = (z - nmin.z) as usize * sx + xi;
                    let (i, cell) = (index3d, vi);
                    index3d += 1;
                    vi += 1;

                    if job.heightmap[j] < water_level - 4 {
                        continue;
                    }
                    let uwatern = uwater[j] * 2.0;
                    if uwatern.abs() > RIDGE_WIDTH {
                        continue;
                    }
                    let widthn = (persist[j] - 0.6) / 0.1;
                    let height_mod = (y + 17) as f32 / 2.5;
                    let width_mod = RIDGE_WIDTH - uwatern.abs();
                    let mut nridge = ridge[i] * y as f32 / 7.0;
                    if y < water_level {
                        nridge = -nridge.abs() * 3.0 * widthn * 0.3;
                    }
                    if nridge + width_mod * height_mod < 0.6 {
                        continue;
                    }

                    let n = if y > water_level {
                        Node::AIR
                    } else {
                        let heat = common.column_heat(V3i::new(nmin.x + xi as i32, nmax.y, z));
                        if heat < 0 && y > water_level + heat / 4 { n_ice } else { n_water }
                    };
                    job.vm.set_node_at(cell, n);
                }
            }
        }
    }

    fn base_terrain_level_at_point(&self, x: i32, z: i32) -> f32 {
        let (fx, fz) = (x as f32, z as f32);
        let hselect = noise_perlin_2d(&self.cfg.np_height_select, fx, fz, self.seed);
        let persist = noise_perlin_2d(&self.cfg.np_terrain_persist, fx, fz, self.seed).clamp(0.4, 0.9);
        let np_base = NoiseParams {
            persist,
            ..self.cfg.np_terrain_base.clone()
        };
        let np_alt = NoiseParams {
            persist,
            ..self.cfg.np_terrain_alt.clone()
        };
        base_terrain_level(
            noise_perlin_2d(&np_base, fx, fz, self.seed),
            noise_perlin_2d(&np_alt, fx, fz, self.seed),
            hselect,
        )
    }

    fn mountain_at_point(&self, x: i32, y: i32, z: i32) -> bool {
        let (fx, fz) = (x as f32, z as f32);
        let mount_h = noise_perlin_2d(&self.cfg.np_mount_height, fx, fz, self.seed);
        let mnt_n = noise_perlin_3d(&self.cfg.np_mountain, fx, y as f32, fz, self.seed);
        mountain_solid(mnt_n, mount_h, y)
    }

    /// Estimated surface height at column (`x`, `z`) without generating it. Inside a river
    /// channel the estimate is `water_level - 10`.
    pub fn ground_level_at_point(&self, water_level: i32, x: i32, z: i32) -> i32 {
        let mut y = self.base_terrain_level_at_point(x, z) as i32;
        if self.cfg.ridges {
            let uwatern = noise_perlin_2d(&self.cfg.np_ridge_uwater, x as f32, z as f32, self.seed) * 2.0;
            if uwatern.abs() <= RIDGE_WIDTH {
                return water_level - 10;
            }
        }
        if !self.cfg.mountains {
            return y;
        }
        for _ in 0..128 {
            if !self.mountain_at_point(x, y, z) {
                return y;
            }
            y += 1;
        }
        y
    }
}
