//! The classic variant: 2D height fields with cliffs, a mud layer that is aged in two
//! passes and flows off steep edges, and five fixed climate zones instead of the biome
//! table.

use strata_geom::{MAP_BLOCKSIZE, MAX_MAP_GENERATION_LIMIT, V3i};
use strata_nodes::{CONTENT_AIR, CONTENT_IGNORE, ContentId, Node, NodeRegistry};
use strata_noise::{NoiseMap, NoiseParams, PseudoRandom, noise_perlin_2d, noise2d};

use crate::config::{BiomesConfig, CarverConfig, V6Config};
use crate::generation::caves::{CavesRandomWalk, RandomWalkParams};
use crate::job::GenerationJob;
use crate::mapgen::MapgenCommon;

const AVERAGE_MUD_AMOUNT: i32 = 4;
const DESERT_STONE_BASE: i32 = -32;
const ICE_BASE: i32 = 0;
const FREQ_HOT: f32 = 0.4;
const FREQ_SNOW: f32 = -0.4;
const FREQ_TAIGA: f32 = 0.5;
const FREQ_JUNGLE: f32 = 0.7;
const AGE_LOOPS: u32 = 2;

const DIRS4: [V3i; 4] = [V3i::new(0, 0, 1), V3i::new(1, 0, 0), V3i::new(0, 0, -1), V3i::new(-1, 0, 0)];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BiomeV6 {
    Normal,
    Desert,
    Jungle,
    Tundra,
    Taiga,
}

/// Blends the base and higher ground fields. Steep cliffs come from `steepness`, which
/// is raised to the 7th power and then snapped away from the 1.5..100 range.
pub fn base_terrain_level(terrain_base: f32, terrain_higher: f32, steepness: f32, height_select: f32) -> f32 {
    let base = 1.0 + terrain_base;
    let higher = (1.0 + terrain_higher).max(base);

    let b = steepness.clamp(0.0, 1000.0);
    let mut b = (5.0 * b.powi(7)).clamp(0.5, 1000.0);
    if b > 1.5 && b < 100.0 {
        b = if b < 10.0 { 1.5 } else { 100.0 };
    }
    let a = (0.5 + b * (-0.2 + height_select)).clamp(0.0, 1.0);
    base * (1.0 - a) + higher * a
}

/// Climate zone from the desert value `d` and humidity `h`. `blend` is the per-column
/// white noise in [-1, 1] that frays zone edges when biome blending is on.
pub fn classify_biome(cfg: &V6Config, d: f32, h: f32, blend: f32) -> BiomeV6 {
    if cfg.snowbiomes {
        let blend = if cfg.biomeblend { blend / 40.0 } else { 0.0 };
        return if d > FREQ_HOT + blend {
            if h > FREQ_JUNGLE + blend { BiomeV6::Jungle } else { BiomeV6::Desert }
        } else if d < FREQ_SNOW + blend {
            if h > FREQ_TAIGA + blend { BiomeV6::Taiga } else { BiomeV6::Tundra }
        } else {
            BiomeV6::Normal
        };
    }
    if d > cfg.freq_desert {
        return BiomeV6::Desert;
    }
    if cfg.biomeblend && d > cfg.freq_desert - 0.1 && blend + 1.0 > (cfg.freq_desert - d) * 20.0 {
        return BiomeV6::Desert;
    }
    if cfg.jungles && h > 0.75 { BiomeV6::Jungle } else { BiomeV6::Normal }
}

/// Surface nodes of the variant. Unregistered names fall back to a related node.
#[derive(Copy, Clone, Debug)]
struct V6Nodes {
    desert_stone: ContentId,
    dirt: ContentId,
    dirt_with_grass: ContentId,
    dirt_with_snow: ContentId,
    sand: ContentId,
    desert_sand: ContentId,
    gravel: ContentId,
    snowblock: ContentId,
    snow: ContentId,
}

impl V6Nodes {
    fn resolve(reg: &NodeRegistry, stone: ContentId) -> Self {
        let or = |name: &str, fallback: ContentId| reg.id_of(name).unwrap_or(fallback);
        let dirt = or("mapgen_dirt", stone);
        let dirt_with_grass = or("mapgen_dirt_with_grass", dirt);
        let dirt_with_snow = or("mapgen_dirt_with_snow", dirt_with_grass);
        let sand = or("mapgen_sand", dirt);
        Self {
            desert_stone: or("mapgen_desert_stone", stone),
            dirt,
            dirt_with_grass,
            dirt_with_snow,
            sand,
            desert_sand: or("mapgen_desert_sand", sand),
            gravel: or("mapgen_gravel", stone),
            snowblock: or("mapgen_snowblock", dirt_with_snow),
            snow: or("mapgen_snow", CONTENT_AIR),
        }
    }
}

pub struct V6Gen {
    cfg: V6Config,
    seed: i32,
    nodes: V6Nodes,
    /// Offset and scale mapping climate heat and humidity back to noise units.
    heat_norm: (f32, f32),
    humidity_norm: (f32, f32),
    noise_terrain_base: NoiseMap,
    noise_terrain_higher: NoiseMap,
    noise_steepness: NoiseMap,
    noise_height_select: NoiseMap,
    noise_mud: NoiseMap,
    noise_beach: NoiseMap,
    /// Biome and humidity cover the chunk plus one block of padding on each side.
    noise_biome: NoiseMap,
    noise_humidity: NoiseMap,
    full_sx: usize,
}

/// Origin of a `_PO` sample: the node coordinate moved by `off` spreads.
#[inline]
fn po(np: &NoiseParams, x: i32, xoff: f32, z: i32, zoff: f32) -> (f32, f32) {
    (x as f32 + xoff * np.spread.x, z as f32 + zoff * np.spread.y)
}

impl V6Gen {
    pub fn new(cfg: &V6Config, biomes: &BiomesConfig, reg: &NodeRegistry, stone: ContentId, seed: i32, csize: V3i) -> Self {
        let (sx, sz) = (csize.x as usize, csize.z as usize);
        let pad = 2 * MAP_BLOCKSIZE as usize;
        let map2 = |np: &NoiseParams| NoiseMap::new_2d(np.clone(), seed, sx, sz);
        let full2 = |np: &NoiseParams| NoiseMap::new_2d(np.clone(), seed, sx + pad, sz + pad);
        Self {
            seed,
            nodes: V6Nodes::resolve(reg, stone),
            heat_norm: (biomes.np_heat.offset, biomes.np_heat.scale),
            humidity_norm: (biomes.np_humidity.offset, biomes.np_humidity.scale),
            noise_terrain_base: map2(&cfg.np_terrain_base),
            noise_terrain_higher: map2(&cfg.np_terrain_higher),
            noise_steepness: map2(&cfg.np_steepness),
            noise_height_select: map2(&cfg.np_height_select),
            noise_mud: map2(&cfg.np_mud),
            noise_beach: map2(&cfg.np_beach),
            noise_biome: full2(&cfg.np_biome),
            noise_humidity: full2(&cfg.np_humidity),
            full_sx: sx + pad,
            cfg: cfg.clone(),
        }
    }

    pub fn config(&self) -> &V6Config {
        &self.cfg
    }

    pub fn calculate_noise(&mut self, nmin: V3i, full_min: V3i) {
        let (x, z) = (nmin.x, nmin.z);
        for map in [
            &mut self.noise_terrain_base,
            &mut self.noise_terrain_higher,
            &mut self.noise_steepness,
            &mut self.noise_height_select,
            &mut self.noise_mud,
        ] {
            let (px, pz) = po(map.params(), x, 0.5, z, 0.5);
            map.perlin_map_2d(px, pz, None);
        }
        let (px, pz) = po(self.noise_beach.params(), x, 0.2, z, 0.7);
        self.noise_beach.perlin_map_2d(px, pz, None);

        let (px, pz) = po(self.noise_biome.params(), full_min.x, 0.6, full_min.z, 0.2);
        self.noise_biome.perlin_map_2d(px, pz, None);
        self.noise_humidity
            .perlin_map_2d(full_min.x as f32, full_min.z as f32, None);
    }

    fn base_terrain_level_from_map(&self, index: usize) -> f32 {
        base_terrain_level(
            self.noise_terrain_base.result()[index],
            self.noise_terrain_higher.result()[index],
            self.noise_steepness.result()[index],
            self.noise_height_select.result()[index],
        )
    }

    fn base_terrain_level_at_point(&self, x: i32, z: i32) -> f32 {
        let at = |np: &NoiseParams| {
            let (px, pz) = po(np, x, 0.5, z, 0.5);
            noise_perlin_2d(np, px, pz, self.seed)
        };
        base_terrain_level(
            at(&self.cfg.np_terrain_base),
            at(&self.cfg.np_terrain_higher),
            at(&self.cfg.np_steepness),
            at(&self.cfg.np_height_select),
        )
    }

    /// Climate zone of `p`, read from the padded biome maps of the current chunk. A
    /// climate feed replaces both noise values where it has one.
    fn biome_at(&self, common: &MapgenCommon, full_min: V3i, p: V3i) -> BiomeV6 {
        let index = (p.z - full_min.z) as usize * self.full_sx + (p.x - full_min.x) as usize;
        let mut d = self.noise_biome.result()[index];
        let mut h = self.noise_humidity.result()[index];
        if let Some(climate) = &common.climate {
            if let Some(heat) = climate.heat(p) {
                d = (heat - self.heat_norm.0) / self.heat_norm.1;
            }
            if let Some(hum) = climate.humidity(p) {
                h = (hum - self.humidity_norm.0) / self.humidity_norm.1;
            }
        }
        classify_biome(&self.cfg, d, h, noise2d(p.x, p.z, self.seed))
    }

    /// Stone up to the blended height, desert stone near the surface of deserts, water
    /// or ice below the water level and air above. Returns the highest stone y.
    pub fn generate_ground(&mut self, common: &MapgenCommon, job: &mut GenerationJob) -> i32 {
        let nmin = job.node_min();
        let nmax = job.node_max();
        let full_min = job.full_node_min();
        self.calculate_noise(nmin, full_min);

        let n_stone = Node::new(common.ids.stone);
        let n_desert_stone = Node::new(self.nodes.desert_stone);
        let n_water = Node::new(common.ids.water_source);
        let n_ice = Node::new(common.ids.ice);
        let water_level = common.water_level;
        let area = *job.vm.area();
        let ystride = area.y_stride();

        let mut stone_surface_max_y = -MAX_MAP_GENERATION_LIMIT;
        let mut index = 0usize;
        for z in nmin.z..=nmax.z {
            for x in nmin.x..=nmax.x {
                let surface_y = self.base_terrain_level_from_map(index) as i32;
                stone_surface_max_y = stone_surface_max_y.max(surface_y);
                let bt = self.biome_at(common, full_min, V3i::new(x, nmin.y, z));
                let heat = common.column_heat(V3i::new(x, nmax.y, z));

                let mut vi = area.index(V3i::new(x, nmin.y - 1, z));
                for y in nmin.y - 1..=nmax.y + 1 {
                    if job.vm.node_at(vi).is_ignore() {
                        let n = if y <= surface_y {
                            if bt == BiomeV6::Desert && y >= DESERT_STONE_BASE - surface_y {
                                n_desert_stone
                            } else {
                                n_stone
                            }
                        } else if y <= water_level {
                            if (heat < 0 && y > heat / 3) || (bt == BiomeV6::Tundra && y >= ICE_BASE) {
                                n_ice
                            } else {
                                n_water
                            }
                        } else {
                            Node::AIR
                        };
                        job.vm.set_node_at(vi, n);
                    }
                    vi += ystride;
                }
                index += 1;
            }
        }
        stone_surface_max_y
    }

    /// Caves, mud and mudflow, run twice so later caves cut through earlier mud.
    pub fn age_terrain(
        &self,
        common: &MapgenCommon,
        carvers: &CarverConfig,
        job: &mut GenerationJob,
        max_stone_y: i32,
        caves: bool,
    ) {
        let params = RandomWalkParams {
            registry: &common.registry,
            biomegen: None,
            np_cave_liquids: &carvers.np_cave_liquids,
            seed: common.seed,
            water_level: common.water_level,
            c_water_source: common.ids.water_source,
            c_lava_source: common.ids.lava_source,
            large_cave_flooded: carvers.large_cave_flooded,
        };
        for _ in 0..AGE_LOOPS {
            if caves {
                self.generate_caves(common, &params, job, max_stone_y);
            }
            self.add_mud(common, job);
            if self.cfg.mudflow {
                self.flow_mud(common, job);
            }
        }
    }

    fn generate_caves(&self, common: &MapgenCommon, params: &RandomWalkParams<'_>, job: &mut GenerationJob, max_stone_y: i32) {
        let nmin = job.node_min();
        let nmax = job.node_max();
        let amount = noise_perlin_2d(&self.cfg.np_cave, nmin.x as f32, nmin.y as f32, self.seed).max(0.0);
        let volume = ((nmax.x - nmin.x + 1) * (nmax.y - nmin.y + 1) * MAP_BLOCKSIZE) as f32;
        let mut caves = (amount * volume / 50_000.0) as u32;
        let mut ps = PseudoRandom::new(job.blockseed().wrapping_add(21343) as i32);
        let mut bruises = 1u32;
        if ps.range(1, 6) == 1 {
            let hi = ps.range(0, 2);
            bruises = ps.range(0, hi) as u32;
        }
        if self.biome_at(common, job.full_node_min(), nmin) == BiomeV6::Desert {
            caves /= 3;
            bruises /= 3;
        }
        log::trace!(target: "mapgen", "v6 caves at {nmin:?}: {caves} small, {bruises} large");
        for i in 0..caves + bruises {
            CavesRandomWalk::new(params).make_cave(job, &mut ps, i >= caves, max_stone_y);
        }
    }

    /// Highest stone-like node of the column within the whole buffer.
    fn find_stone_level(&self, common: &MapgenCommon, job: &GenerationJob, x: i32, z: i32) -> Option<i32> {
        let n = &self.nodes;
        let ids = &common.ids;
        let stony = [
            ids.stone,
            n.desert_stone,
            n.sand,
            n.gravel,
            n.desert_sand,
            ids.cobble,
            ids.stair_cobble,
            ids.mossycobble,
        ];
        let area = job.vm.area();
        (area.min.y..=area.max.y).rev().find(|&y| {
            let c = job.vm.get_node(V3i::new(x, y, z)).content;
            c != CONTENT_IGNORE && stony.contains(&c)
        })
    }

    fn add_mud(&self, common: &MapgenCommon, job: &mut GenerationJob) {
        let nmin = job.node_min();
        let nmax = job.node_max();
        let full_min = job.full_node_min();
        let water_level = common.water_level;
        let n = self.nodes;

        let mut index = 0usize;
        for z in nmin.z..=nmax.z {
            for x in nmin.x..=nmax.x {
                let i = index;
                index += 1;
                let mut amount = (self.noise_mud.result()[i] / 2.0 + 0.5) as i32;
                let Some(surface_y) = self.find_stone_level(common, job, x, z) else {
                    continue;
                };
                let bt = self.biome_at(common, full_min, V3i::new(x, surface_y, z));
                let desert = bt == BiomeV6::Desert;

                let mut addnode = if desert { n.desert_sand } else { n.dirt };
                if desert && surface_y + amount <= water_level + 1 {
                    addnode = n.sand;
                } else if amount <= 0 {
                    amount = 1 - amount;
                    addnode = n.gravel;
                } else if !desert
                    && self.noise_beach.result()[i] > self.cfg.freq_beach
                    && surface_y + amount <= water_level + 2
                {
                    addnode = n.sand;
                }
                if (desert || bt == BiomeV6::Tundra) && surface_y > 20 {
                    amount = (amount - (surface_y - 20) / 5).max(0);
                }

                let top = nmax.y.min(surface_y + amount);
                for y in surface_y + 1..=top {
                    job.vm.set_node(V3i::new(x, y, z), Node::new(addnode));
                }
            }
        }
    }

    fn is_mud(&self, c: ContentId) -> bool {
        c == self.nodes.dirt || c == self.nodes.dirt_with_grass || c == self.nodes.gravel
    }

    /// Three passes over the chunk and all but the outermost ring of its padding, the
    /// first and last in reverse order. Loose mud with open space above slides one node
    /// sideways and drops until it lands.
    fn flow_mud(&self, common: &MapgenCommon, job: &mut GenerationJob) {
        let nmin = job.node_min();
        let csize = job.chunk_size();
        let spread = MAP_BLOCKSIZE;
        let (minpos, maxpos) = (-spread + 1, csize.x + spread - 2);

        for k in 0..3 {
            for zi in minpos..=maxpos {
                for xi in minpos..=maxpos {
                    let (x, z) = if k % 2 == 0 {
                        (maxpos - (xi - minpos), maxpos - (zi - minpos))
                    } else {
                        (xi, zi)
                    };
                    self.flow_column(common, job, nmin.x + x, nmin.z + z);
                }
            }
        }
    }

    fn flow_column(&self, common: &MapgenCommon, job: &mut GenerationJob, x: i32, z: i32) {
        let reg = &common.registry;
        let area = *job.vm.area();
        let (ymin, ymax) = (job.node_min().y, job.node_max().y);
        let walkable = |job: &GenerationJob, p: V3i| reg.features_of(job.vm.get_node(p).content).walkable;
        let up = V3i::new(0, 1, 0);

        let mut y = ymax;
        while y >= ymin {
            while y >= ymin && !self.is_mud(job.vm.get_node(V3i::new(x, y, z)).content) {
                y -= 1;
            }
            if y < ymin {
                break;
            }
            let p = V3i::new(x, y, z);
            y -= 1;

            let c = job.vm.get_node(p).content;
            if c == self.nodes.dirt || c == self.nodes.dirt_with_grass {
                job.vm.set_node(p, Node::new(self.nodes.dirt));
                // only mud resting on mud flows
                let below = p - up;
                if !area.contains(below) {
                    continue;
                }
                let cb = job.vm.get_node(below).content;
                if cb != self.nodes.dirt && cb != self.nodes.dirt_with_grass {
                    continue;
                }
            }
            if area.contains(p + up) && walkable(job, p + up) {
                continue;
            }

            for dir in DIRS4 {
                let side = p + dir;
                if !area.contains(side) || walkable(job, side) {
                    continue;
                }
                let mut q = side - up;
                if !area.contains(q) || walkable(job, q) {
                    continue;
                }
                let landed = loop {
                    q = q - up;
                    if !area.contains(q) || job.vm.get_node(q).is_ignore() {
                        break false;
                    }
                    if walkable(job, q) {
                        break true;
                    }
                };
                if landed {
                    let mud = job.vm.get_node(p);
                    job.vm.set_node(q + up, mud);
                    job.vm.set_node(p, Node::AIR);
                }
                break;
            }
        }
    }

    /// Turns exposed dirt into the surface node of its zone over the chunk and its
    /// padding. Runs after liquids are queued.
    pub fn grow_grass(&self, common: &MapgenCommon, job: &mut GenerationJob) {
        let reg = &common.registry;
        let nmax = job.node_max();
        let (full_min, full_max) = (job.full_node_min(), job.full_node_max());
        let n = self.nodes;
        let up = V3i::new(0, 1, 0);

        for z in full_min.z..=full_max.z {
            for x in full_min.x..=full_max.x {
                let surface_y = (full_min.y..=nmax.y)
                    .rev()
                    .find(|&y| {
                        let c = job.vm.get_node(V3i::new(x, y, z)).content;
                        let f = reg.features_of(c);
                        !f.light_propagates || f.is_liquid() || c == common.ids.ice
                    })
                    .unwrap_or(full_min.y);
                let p = V3i::new(x, surface_y, z);
                let c = job.vm.get_node(p).content;

                if common.climate.is_some() && c == n.dirt {
                    let heat = common.column_heat(p);
                    let top = if heat < -10 {
                        n.dirt_with_snow
                    } else if heat < -5 || heat > 50 {
                        n.dirt
                    } else {
                        n.dirt_with_grass
                    };
                    job.vm.set_node(p, Node::new(top));
                    continue;
                }
                if surface_y < common.water_level - 20 {
                    continue;
                }
                match self.biome_at(common, full_min, p) {
                    BiomeV6::Taiga if c == n.dirt => {
                        job.vm.set_node(p, Node::new(n.snowblock));
                        if job.vm.area().contains(p - up) {
                            job.vm.set_node(p - up, Node::new(n.dirt_with_snow));
                        }
                    }
                    BiomeV6::Tundra => {
                        if c == n.dirt {
                            job.vm.set_node(p, Node::new(n.dirt_with_snow));
                        } else if c == common.ids.stone && surface_y < nmax.y {
                            job.vm.set_node(p + up, Node::new(n.snow));
                        }
                    }
                    _ if c == n.dirt => job.vm.set_node(p, Node::new(n.dirt_with_grass)),
                    _ => {}
                }
            }
        }
    }

    /// Ground estimate for column (`x`, `z`): the stone height plus average mud.
    pub fn ground_level_at_point(&self, x: i32, z: i32) -> i32 {
        self.base_terrain_level_at_point(x, z) as i32 + AVERAGE_MUD_AMOUNT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_steepness_picks_between_fields() {
        // b floors at 0.5: a = 0.5 + 0.5 * (-0.2 + hs)
        let lo = base_terrain_level(9.0, 29.0, 0.0, -0.8);
        assert_eq!(lo, 10.0);
        let hi = base_terrain_level(9.0, 29.0, 0.0, 1.2);
        assert_eq!(hi, 30.0);
        // higher never drops below base
        assert_eq!(base_terrain_level(20.0, -50.0, 0.0, 1.2), 21.0);
    }

    #[test]
    fn steep_cliffs_snap_to_either_field() {
        // 5 * 1.2^7 is about 17.9, snapped up to 100
        let just_above = base_terrain_level(0.0, 40.0, 1.2, 0.21);
        assert_eq!(just_above, 41.0);
        let just_below = base_terrain_level(0.0, 40.0, 1.2, 0.19);
        assert_eq!(just_below, 1.0);
    }

    #[test]
    fn desert_threshold_and_blending() {
        let mut cfg = V6Config {
            biomeblend: false,
            ..V6Config::default()
        };
        assert_eq!(classify_biome(&cfg, 0.5, 0.0, 0.0), BiomeV6::Desert);
        assert_eq!(classify_biome(&cfg, 0.4, 0.0, 1.0), BiomeV6::Normal);

        cfg.biomeblend = true;
        // 0.4 is within 0.1 of the threshold: (0.45 - 0.4) * 20 = 1
        assert_eq!(classify_biome(&cfg, 0.4, 0.0, 0.5), BiomeV6::Desert);
        assert_eq!(classify_biome(&cfg, 0.4, 0.0, -0.5), BiomeV6::Normal);

        assert_eq!(classify_biome(&cfg, 0.0, 0.9, 0.0), BiomeV6::Normal);
        cfg.jungles = true;
        assert_eq!(classify_biome(&cfg, 0.0, 0.9, 0.0), BiomeV6::Jungle);
    }

    #[test]
    fn snow_zones() {
        let cfg = V6Config {
            snowbiomes: true,
            biomeblend: false,
            ..V6Config::default()
        };
        assert_eq!(classify_biome(&cfg, 0.6, 0.8, 0.0), BiomeV6::Jungle);
        assert_eq!(classify_biome(&cfg, 0.6, 0.2, 0.0), BiomeV6::Desert);
        assert_eq!(classify_biome(&cfg, -0.6, 0.6, 0.0), BiomeV6::Taiga);
        assert_eq!(classify_biome(&cfg, -0.6, 0.2, 0.0), BiomeV6::Tundra);
        assert_eq!(classify_biome(&cfg, 0.0, 0.9, 0.0), BiomeV6::Normal);
    }

    #[test]
    fn ground_estimate_adds_mud() {
        let reg = NodeRegistry::mapgen_defaults().unwrap();
        let stone = reg.id_of("mapgen_stone").unwrap();
        let cfg = V6Config::default();
        let g = V6Gen::new(&cfg, &BiomesConfig::default(), &reg, stone, 7, V3i::splat(80));
        for (x, z) in [(0, 0), (300, -41), (-2000, 777)] {
            assert_eq!(
                g.ground_level_at_point(x, z),
                g.base_terrain_level_at_point(x, z) as i32 + AVERAGE_MUD_AMOUNT
            );
        }
    }
}
