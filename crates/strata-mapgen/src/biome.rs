//! Biome definitions and heat/humidity based selection.

use std::sync::Arc;

use hashbrown::HashSet;
use serde::Deserialize;
use strata_geom::{MAX_MAP_GENERATION_LIMIT, V3i};
use strata_nodes::{CONTENT_AIR, CONTENT_IGNORE, ContentId, NodeRegistry};
use strata_noise::{NoiseMap, NoiseParams, PcgRandom, noise_perlin_2d};

use crate::climate::ClimateFeed;
use crate::config::BiomesConfig;

pub type BiomeId = u16;

/// Index of the built-in fallback biome.
pub const BIOME_NONE: BiomeId = 0;

/// Biome set used when a configuration lists none of its own.
pub const DEFAULT_BIOMES_TOML: &str = include_str!("../assets/default_biomes.toml");

#[derive(Debug, thiserror::Error)]
pub enum BiomeConfigError {
    #[error("biome '{0}' is defined more than once")]
    DuplicateName(String),
    #[error("biome '{biome}' refers to unknown node '{node}'")]
    UnknownNode { biome: String, node: String },
    #[error("biome '{biome}' has an empty {axis} range ({min} > {max})")]
    EmptyRange {
        biome: String,
        axis: char,
        min: i32,
        max: i32,
    },
    #[error("too many biomes (limit {0})")]
    TooMany(usize),
}

#[derive(Clone, Debug, Deserialize)]
pub struct BiomeDef {
    pub name: String,
    #[serde(default)]
    pub node_top: Option<String>,
    #[serde(default)]
    pub node_filler: Option<String>,
    #[serde(default)]
    pub node_stone: Option<String>,
    #[serde(default)]
    pub node_water_top: Option<String>,
    #[serde(default)]
    pub node_water: Option<String>,
    #[serde(default)]
    pub node_river_water: Option<String>,
    #[serde(default)]
    pub node_riverbed: Option<String>,
    #[serde(default)]
    pub node_dust: Option<String>,
    #[serde(default)]
    pub node_cave_liquid: Vec<String>,
    #[serde(default)]
    pub node_dungeon: Option<String>,
    #[serde(default)]
    pub node_dungeon_alt: Option<String>,
    #[serde(default)]
    pub node_dungeon_stair: Option<String>,
    #[serde(default)]
    pub node_ice: Option<String>,
    #[serde(default)]
    pub node_top_cold: Option<String>,
    #[serde(default)]
    pub depth_top: i32,
    #[serde(default = "default_depth_filler")]
    pub depth_filler: i32,
    #[serde(default)]
    pub depth_water_top: i32,
    #[serde(default)]
    pub depth_riverbed: i32,
    #[serde(default = "default_min")]
    pub y_min: i32,
    #[serde(default = "default_max")]
    pub y_max: i32,
    #[serde(default = "default_min")]
    pub x_min: i32,
    #[serde(default = "default_max")]
    pub x_max: i32,
    #[serde(default = "default_min")]
    pub z_min: i32,
    #[serde(default = "default_max")]
    pub z_max: i32,
    #[serde(default)]
    pub heat_point: f32,
    #[serde(default)]
    pub humidity_point: f32,
    #[serde(default)]
    pub vertical_blend: i32,
    #[serde(default = "default_weight")]
    pub weight: f32,
}
fn default_depth_filler() -> i32 {
    -MAX_MAP_GENERATION_LIMIT
}
fn default_min() -> i32 {
    -MAX_MAP_GENERATION_LIMIT
}
fn default_max() -> i32 {
    MAX_MAP_GENERATION_LIMIT
}
fn default_weight() -> f32 {
    1.0
}

#[derive(Clone, Debug, Default, Deserialize)]
struct BiomeList {
    #[serde(default)]
    list: Vec<BiomeDef>,
}

impl BiomeDef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_top: None,
            node_filler: None,
            node_stone: None,
            node_water_top: None,
            node_water: None,
            node_river_water: None,
            node_riverbed: None,
            node_dust: None,
            node_cave_liquid: Vec::new(),
            node_dungeon: None,
            node_dungeon_alt: None,
            node_dungeon_stair: None,
            node_ice: None,
            node_top_cold: None,
            depth_top: 0,
            depth_filler: default_depth_filler(),
            depth_water_top: 0,
            depth_riverbed: 0,
            y_min: default_min(),
            y_max: default_max(),
            x_min: default_min(),
            x_max: default_max(),
            z_min: default_min(),
            z_max: default_max(),
            heat_point: 0.0,
            humidity_point: 0.0,
            vertical_blend: 0,
            weight: 1.0,
        }
    }
}

/// A biome with every node name resolved to a content id. Immutable once registered.
#[derive(Clone, Debug)]
pub struct BiomeRecord {
    pub index: BiomeId,
    pub name: String,
    pub c_top: ContentId,
    pub c_filler: ContentId,
    pub c_stone: ContentId,
    pub c_water_top: ContentId,
    pub c_water: ContentId,
    pub c_river_water: ContentId,
    pub c_riverbed: ContentId,
    pub c_dust: ContentId,
    pub c_cave_liquid: Vec<ContentId>,
    pub c_dungeon: ContentId,
    pub c_dungeon_alt: ContentId,
    pub c_dungeon_stair: ContentId,
    pub c_ice: ContentId,
    pub c_top_cold: ContentId,
    pub depth_top: i32,
    pub depth_filler: i32,
    pub depth_water_top: i32,
    pub depth_riverbed: i32,
    pub min_pos: V3i,
    pub max_pos: V3i,
    pub heat_point: f32,
    pub humidity_point: f32,
    pub vertical_blend: i32,
    pub weight: f32,
}

struct Resolver<'a> {
    reg: &'a NodeRegistry,
    biome: &'a str,
}

impl Resolver<'_> {
    /// Explicit names must exist; an absent name falls back to `default_name`, then to
    /// `fallback` when the default node is not registered either.
    fn id(
        &self,
        name: &Option<String>,
        default_name: &str,
        fallback: ContentId,
    ) -> Result<ContentId, BiomeConfigError> {
        match name {
            Some(n) => self.named(n),
            None => Ok(self.reg.id_of(default_name).unwrap_or(fallback)),
        }
    }

    fn named(&self, n: &str) -> Result<ContentId, BiomeConfigError> {
        self.reg
            .id_of(n)
            .ok_or_else(|| BiomeConfigError::UnknownNode {
                biome: self.biome.to_string(),
                node: n.to_string(),
            })
    }
}

impl BiomeRecord {
    fn resolve(index: BiomeId, def: &BiomeDef, reg: &NodeRegistry) -> Result<Self, BiomeConfigError> {
        for (axis, min, max) in [
            ('x', def.x_min, def.x_max),
            ('y', def.y_min, def.y_max),
            ('z', def.z_min, def.z_max),
        ] {
            if min > max {
                return Err(BiomeConfigError::EmptyRange {
                    biome: def.name.clone(),
                    axis,
                    min,
                    max,
                });
            }
        }
        let r = Resolver {
            reg,
            biome: &def.name,
        };
        let c_top = r.id(&def.node_top, "mapgen_stone", CONTENT_AIR)?;
        let c_water = r.id(&def.node_water, "mapgen_water_source", CONTENT_AIR)?;
        let mut c_cave_liquid = Vec::with_capacity(def.node_cave_liquid.len());
        for n in &def.node_cave_liquid {
            c_cave_liquid.push(r.named(n)?);
        }
        Ok(Self {
            index,
            name: def.name.clone(),
            c_top,
            c_filler: r.id(&def.node_filler, "mapgen_stone", CONTENT_AIR)?,
            c_stone: r.id(&def.node_stone, "mapgen_stone", CONTENT_AIR)?,
            c_water_top: r.id(&def.node_water_top, "mapgen_water_source", c_water)?,
            c_water,
            c_river_water: r.id(&def.node_river_water, "mapgen_river_water_source", c_water)?,
            c_riverbed: r.id(&def.node_riverbed, "mapgen_stone", CONTENT_AIR)?,
            c_dust: r.id(&def.node_dust, "ignore", CONTENT_IGNORE)?,
            c_cave_liquid,
            c_dungeon: r.id(&def.node_dungeon, "ignore", CONTENT_IGNORE)?,
            c_dungeon_alt: r.id(&def.node_dungeon_alt, "ignore", CONTENT_IGNORE)?,
            c_dungeon_stair: r.id(&def.node_dungeon_stair, "ignore", CONTENT_IGNORE)?,
            c_ice: r.id(&def.node_ice, "mapgen_ice", c_water)?,
            c_top_cold: match &def.node_top_cold {
                Some(n) => r.named(n)?,
                None if def.node_top.is_some() => c_top,
                None => reg.id_of("mapgen_dirt_with_snow").unwrap_or(c_top),
            },
            depth_top: def.depth_top,
            depth_filler: def.depth_filler,
            depth_water_top: def.depth_water_top,
            depth_riverbed: def.depth_riverbed,
            min_pos: V3i::new(def.x_min, def.y_min, def.z_min),
            max_pos: V3i::new(def.x_max, def.y_max, def.z_max),
            heat_point: def.heat_point,
            humidity_point: def.humidity_point,
            vertical_blend: def.vertical_blend.max(0),
            weight: def.weight,
        })
    }

    fn contains_xz(&self, p: V3i) -> bool {
        p.x >= self.min_pos.x && p.x <= self.max_pos.x && p.z >= self.min_pos.z && p.z <= self.max_pos.z
    }
}

/// Registered biomes. Index 0 is always the "default" biome.
#[derive(Clone, Debug)]
pub struct BiomeManager {
    biomes: Vec<BiomeRecord>,
}

impl BiomeManager {
    pub fn new(reg: &NodeRegistry) -> Self {
        let record = BiomeRecord::resolve(BIOME_NONE, &BiomeDef::named("default"), reg)
            .expect("default biome names no explicit nodes");
        Self {
            biomes: vec![record],
        }
    }

    pub fn from_defs(defs: &[BiomeDef], reg: &NodeRegistry) -> Result<Self, BiomeConfigError> {
        let mut mgr = Self::new(reg);
        let mut seen: HashSet<&str> = HashSet::new();
        for def in defs {
            if def.name == "default" || !seen.insert(def.name.as_str()) {
                return Err(BiomeConfigError::DuplicateName(def.name.clone()));
            }
            mgr.add(def, reg)?;
        }
        log::debug!(target: "mapgen", "registered {} biomes", mgr.biomes.len() - 1);
        Ok(mgr)
    }

    /// Biomes from `cfg.list`, or the bundled set when the list is empty.
    pub fn from_config(cfg: &BiomesConfig, reg: &NodeRegistry) -> Result<Self, Box<dyn std::error::Error>> {
        if cfg.list.is_empty() {
            let bundled: BiomeList = toml::from_str(DEFAULT_BIOMES_TOML)?;
            return Ok(Self::from_defs(&bundled.list, reg)?);
        }
        Ok(Self::from_defs(&cfg.list, reg)?)
    }

    pub fn add(&mut self, def: &BiomeDef, reg: &NodeRegistry) -> Result<BiomeId, BiomeConfigError> {
        let index = self.biomes.len();
        if index > usize::from(BiomeId::MAX) {
            return Err(BiomeConfigError::TooMany(usize::from(BiomeId::MAX)));
        }
        let record = BiomeRecord::resolve(index as BiomeId, def, reg)?;
        self.biomes.push(record);
        Ok(index as BiomeId)
    }

    /// Biome at `id`, or the default biome for ids that were never registered.
    #[inline]
    pub fn get(&self, id: BiomeId) -> &BiomeRecord {
        self.biomes
            .get(usize::from(id))
            .unwrap_or(&self.biomes[usize::from(BIOME_NONE)])
    }

    pub fn by_name(&self, name: &str) -> Option<&BiomeRecord> {
        self.biomes.iter().find(|b| b.name == name)
    }

    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BiomeRecord> {
        self.biomes.iter()
    }

    /// Y levels at which the selected biome may change, highest first.
    fn transitions(&self) -> Vec<i32> {
        let mut values = Vec::with_capacity(self.biomes.len() * 2);
        for b in &self.biomes {
            values.push(b.max_pos.y);
            if b.min_pos.y > -MAX_MAP_GENERATION_LIMIT {
                values.push(b.min_pos.y - 1);
            }
        }
        values.sort_unstable_by(|a, b| b.cmp(a));
        values.dedup();
        values
    }
}

/// Picks the closest biome for a heat/humidity pair at `pos`.
///
/// Candidates must contain `pos` in x/z and in y, where a biome also covers the
/// `vertical_blend` nodes above its top; inside that band it wins only when a
/// `PcgRandom` seeded from the position and climate agrees.
pub fn calc_biome_from_noise<'a>(
    mgr: &'a BiomeManager,
    np_heat: &NoiseParams,
    heat: f32,
    humidity: f32,
    pos: V3i,
) -> &'a BiomeRecord {
    let mut closest: Option<&'a BiomeRecord> = None;
    let mut closest_blend: Option<&'a BiomeRecord> = None;
    let mut dist_min = f32::MAX;
    let mut dist_min_blend = f32::MAX;

    for b in mgr.biomes.iter().skip(1) {
        if pos.y < b.min_pos.y || pos.y > b.max_pos.y + b.vertical_blend || !b.contains_xz(pos) {
            continue;
        }
        let heat_point = (b.heat_point - 50.0) * ((np_heat.offset + np_heat.scale) / 100.0) + np_heat.offset;
        let d_heat = heat - heat_point;
        let d_humidity = humidity - b.humidity_point;
        let mut dist = d_heat * d_heat + d_humidity * d_humidity;
        if b.weight > 0.0 {
            dist /= b.weight;
        }
        if pos.y <= b.max_pos.y {
            if dist < dist_min {
                dist_min = dist;
                closest = Some(b);
            }
        } else if dist < dist_min_blend {
            dist_min_blend = dist;
            closest_blend = Some(b);
        }
    }

    let seed = (pos.y as f32 + (heat + humidity) * 0.9) as i64 as u64;
    let mut rng = PcgRandom::new(seed);
    if let Some(b) = closest_blend {
        if dist_min_blend <= dist_min && rng.range(0, b.vertical_blend) >= pos.y - b.max_pos.y {
            return b;
        }
    }
    closest.unwrap_or_else(|| mgr.get(BIOME_NONE))
}

/// Per-worker biome noise over one mapchunk's columns.
pub struct BiomeGen {
    mgr: Arc<BiomeManager>,
    np_heat: NoiseParams,
    np_humidity: NoiseParams,
    np_heat_blend: NoiseParams,
    np_humidity_blend: NoiseParams,
    seed: i32,
    csize: V3i,
    pmin: V3i,
    noise_heat: NoiseMap,
    noise_humidity: NoiseMap,
    noise_heat_blend: NoiseMap,
    noise_humidity_blend: NoiseMap,
    transitions: Vec<i32>,
    climate: Option<Arc<dyn ClimateFeed>>,
}

impl BiomeGen {
    pub fn new(
        mgr: Arc<BiomeManager>,
        cfg: &BiomesConfig,
        seed: i32,
        csize: V3i,
        climate: Option<Arc<dyn ClimateFeed>>,
    ) -> Self {
        let (sx, sz) = (csize.x as usize, csize.z as usize);
        let transitions = mgr.transitions();
        Self {
            np_heat: cfg.np_heat.clone(),
            np_humidity: cfg.np_humidity.clone(),
            np_heat_blend: cfg.np_heat_blend.clone(),
            np_humidity_blend: cfg.np_humidity_blend.clone(),
            seed,
            csize,
            pmin: V3i::ZERO,
            noise_heat: NoiseMap::new_2d(cfg.np_heat.clone(), seed, sx, sz),
            noise_humidity: NoiseMap::new_2d(cfg.np_humidity.clone(), seed, sx, sz),
            noise_heat_blend: NoiseMap::new_2d(cfg.np_heat_blend.clone(), seed, sx, sz),
            noise_humidity_blend: NoiseMap::new_2d(cfg.np_humidity_blend.clone(), seed, sx, sz),
            transitions,
            climate,
            mgr,
        }
    }

    pub fn manager(&self) -> &Arc<BiomeManager> {
        &self.mgr
    }

    pub fn chunk_size(&self) -> V3i {
        self.csize
    }

    pub fn heat_at_point(&self, pos: V3i) -> f32 {
        if let Some(h) = self.climate.as_ref().and_then(|c| c.heat(pos)) {
            return h;
        }
        let (x, z) = (pos.x as f32, pos.z as f32);
        noise_perlin_2d(&self.np_heat, x, z, self.seed) + noise_perlin_2d(&self.np_heat_blend, x, z, self.seed)
    }

    pub fn humidity_at_point(&self, pos: V3i) -> f32 {
        let h = match self.climate.as_ref().and_then(|c| c.humidity(pos)) {
            Some(h) => h,
            None => {
                let (x, z) = (pos.x as f32, pos.z as f32);
                noise_perlin_2d(&self.np_humidity, x, z, self.seed)
                    + noise_perlin_2d(&self.np_humidity_blend, x, z, self.seed)
            }
        };
        h.clamp(0.0, 100.0)
    }

    pub fn calc_biome_at_point(&self, pos: V3i) -> &BiomeRecord {
        calc_biome_from_noise(
            &self.mgr,
            &self.np_heat,
            self.heat_at_point(pos),
            self.humidity_at_point(pos),
            pos,
        )
    }

    /// Fills the heat and humidity maps for the columns starting at `pmin`. Climate
    /// overrides are sampled at the top of each column.
    pub fn calc_biome_noise(&mut self, pmin: V3i) {
        self.pmin = pmin;
        let (x, z) = (pmin.x as f32, pmin.z as f32);
        self.noise_heat.perlin_map_2d(x, z, None);
        self.noise_humidity.perlin_map_2d(x, z, None);
        self.noise_heat_blend.perlin_map_2d(x, z, None);
        self.noise_humidity_blend.perlin_map_2d(x, z, None);

        let top = pmin.y + self.csize.y - 1;
        let sx = self.csize.x as usize;
        let heat = self.noise_heat.result_mut();
        for (h, b) in heat.iter_mut().zip(self.noise_heat_blend.result()) {
            *h += *b;
        }
        let humidity = self.noise_humidity.result_mut();
        for (h, b) in humidity.iter_mut().zip(self.noise_humidity_blend.result()) {
            *h += *b;
        }
        if let Some(climate) = &self.climate {
            for (i, h) in self.noise_heat.result_mut().iter_mut().enumerate() {
                let p = V3i::new(pmin.x + (i % sx) as i32, top, pmin.z + (i / sx) as i32);
                if let Some(v) = climate.heat(p) {
                    *h = v;
                }
            }
            for (i, h) in self.noise_humidity.result_mut().iter_mut().enumerate() {
                let p = V3i::new(pmin.x + (i % sx) as i32, top, pmin.z + (i / sx) as i32);
                if let Some(v) = climate.humidity(p) {
                    *h = v;
                }
            }
        }
        for h in self.noise_humidity.result_mut() {
            *h = h.clamp(0.0, 100.0);
        }
    }

    #[inline]
    pub fn heat(&self, index: usize) -> f32 {
        self.noise_heat.result()[index]
    }

    #[inline]
    pub fn humidity(&self, index: usize) -> f32 {
        self.noise_humidity.result()[index]
    }

    /// Biome for column `index` of the last [`BiomeGen::calc_biome_noise`] call at height `pos.y`.
    pub fn biome_at_index(&self, index: usize, pos: V3i) -> &BiomeRecord {
        calc_biome_from_noise(&self.mgr, &self.np_heat, self.heat(index), self.humidity(index), pos)
    }

    /// Same as [`BiomeGen::biome_at_index`] addressed by position inside the chunk.
    pub fn biome_at_point(&self, pos: V3i) -> &BiomeRecord {
        let index = (pos.z - self.pmin.z) as usize * self.csize.x as usize + (pos.x - self.pmin.x) as usize;
        self.biome_at_index(index, pos)
    }

    /// Biome ids per column using `heightmap` for the y coordinate.
    pub fn biomes_for_heightmap(&self, heightmap: &[i32], out: &mut [BiomeId]) {
        let sx = self.csize.x as usize;
        for (i, (&y, slot)) in heightmap.iter().zip(out.iter_mut()).enumerate() {
            let p = V3i::new(self.pmin.x + (i % sx) as i32, y, self.pmin.z + (i / sx) as i32);
            *slot = self.biome_at_index(i, p).index;
        }
    }

    /// Next y below `y` at which the biome might change, or `i32::MIN`.
    pub fn next_transition_y(&self, y: i32) -> i32 {
        self.transitions
            .iter()
            .copied()
            .find(|&t| t < y)
            .unwrap_or(i32::MIN)
    }
}
