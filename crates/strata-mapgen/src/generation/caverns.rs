use strata_geom::V3i;
use strata_nodes::{ContentId, Node};
use strata_noise::NoiseMap;

use crate::biome::BiomeManager;
use crate::config::CarverConfig;
use crate::job::GenerationJob;

/// Huge caverns from one 3D noise, tapered in towards `cavern_limit`.
pub struct CavernsNoise {
    limit: i32,
    taper: i32,
    threshold: f32,
    liquid_level: i32,
    csize: V3i,
    noise_cavern: NoiseMap,
    cavern_amp: Vec<f32>,
}

impl CavernsNoise {
    pub fn new(cfg: &CarverConfig, seed: i32, csize: V3i) -> Self {
        let (sx, sy, sz) = (csize.x as usize, csize.y as usize + 1, csize.z as usize);
        Self {
            limit: cfg.cavern_limit,
            taper: cfg.cavern_taper.max(1),
            threshold: cfg.cavern_threshold,
            liquid_level: cfg.cavern_liquid_level,
            csize,
            noise_cavern: NoiseMap::new_3d(cfg.np_cavern.clone(), seed, sx, sy, sz),
            cavern_amp: vec![0.0; sy],
        }
    }

    /// Amplitude multiplier at `y`: 1 far below the limit, falling to 0 at it.
    #[inline]
    pub fn amplitude(&self, y: i32) -> f32 {
        ((self.limit - y) as f32 / self.taper as f32).min(1.0)
    }

    /// Carves caverns into ground content and returns whether any cell came within 0.1
    /// of the threshold, which random-walk caves use to stay away.
    ///
    /// The thin shell just inside the threshold becomes biome stone. Cavern space at or
    /// below the liquid level fills with the biome's first cave liquid, or `c_lava`.
    pub fn generate_caverns(&mut self, job: &mut GenerationJob, biomes: &BiomeManager, c_lava: ContentId) -> bool {
        let nmin = job.node_min();
        let nmax = job.node_max();
        self.noise_cavern
            .perlin_map_3d(nmin.x as f32, nmin.y as f32 - 1.0, nmin.z as f32, None);

        for (k, y) in (nmin.y - 1..=nmax.y).rev().enumerate() {
            self.cavern_amp[k] = self.amplitude(y);
        }

        let reg = job.registry.clone();
        let area = *job.vm.area();
        let em_x = area.y_stride();
        let ystride = self.csize.x as usize;
        let zstride = ystride * (self.csize.y as usize + 1);
        let noise = self.noise_cavern.result();
        let shell = self.threshold - 0.1;

        let mut near_cavern = false;
        let mut index2d = 0usize;
        for z in nmin.z..=nmax.z {
            for x in nmin.x..=nmax.x {
                let biome = biomes.get(job.biomemap[index2d]);
                index2d += 1;
                let c_liquid = biome.c_cave_liquid.first().copied().unwrap_or(c_lava);

                let mut vi = area.index(V3i::new(x, nmax.y, z));
                let mut index3d =
                    (z - nmin.z) as usize * zstride + self.csize.y as usize * ystride + (x - nmin.x) as usize;

                // the overgenerated layer above the chunk stays as a roof
                for (k, y) in (nmin.y - 1..=nmax.y).rev().enumerate() {
                    let (i, n3) = (vi, index3d);
                    vi = vi.wrapping_sub(em_x);
                    index3d = index3d.wrapping_sub(ystride);

                    let n_absamp = noise[n3].abs() * self.cavern_amp[k];
                    if n_absamp <= shell {
                        continue;
                    }
                    near_cavern = true;
                    let c = job.vm.node_at(i).content;
                    if !reg.features_of(c).is_ground_content {
                        continue;
                    }
                    if n_absamp > self.threshold {
                        let n = if y <= self.liquid_level { Node::new(c_liquid) } else { Node::AIR };
                        job.vm.set_node_at(i, n);
                    } else {
                        job.vm.set_node_at(i, Node::new(biome.c_stone));
                    }
                }
            }
        }
        near_cavern
    }
}
