use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

use strata_geom::{MAX_MAP_GENERATION_LIMIT, Vec3};
use strata_noise::{NoiseFlags, NoiseParams};

use crate::biome::BiomeDef;

#[derive(Clone, Debug, Deserialize)]
pub struct MapgenConfig {
    #[serde(default = "default_mg_name")]
    pub mg_name: MapgenName,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_water_level")]
    pub water_level: i32,
    #[serde(default = "default_chunksize")]
    pub chunksize: i32,
    #[serde(default)]
    pub flags: MapgenFlags,
    #[serde(default)]
    pub v7: V7Config,
    #[serde(default)]
    pub v5: V5Config,
    #[serde(default)]
    pub v6: V6Config,
    #[serde(default)]
    pub flat: FlatConfig,
    #[serde(default)]
    pub carvers: CarverConfig,
    #[serde(default)]
    pub biomes: BiomesConfig,
    #[serde(default)]
    pub climate: Option<ClimateConfig>,
    /// Stone layer sequence; empty keeps plain `mapgen_stone`.
    #[serde(default)]
    pub layers: Vec<LayerDef>,
    #[serde(default = "default_layer_thickness")]
    pub layer_default_thickness: i32,
    #[serde(default = "default_layer_thickness")]
    pub layer_thickness_multiplier: i32,
    #[serde(default = "default_np_layers")]
    pub np_layers: NoiseParams,
}

impl Default for MapgenConfig {
    fn default() -> Self {
        Self {
            mg_name: default_mg_name(),
            seed: default_seed(),
            water_level: default_water_level(),
            chunksize: default_chunksize(),
            flags: MapgenFlags::default(),
            v7: V7Config::default(),
            v5: V5Config::default(),
            v6: V6Config::default(),
            flat: FlatConfig::default(),
            carvers: CarverConfig::default(),
            biomes: BiomesConfig::default(),
            climate: None,
            layers: Vec::new(),
            layer_default_thickness: default_layer_thickness(),
            layer_thickness_multiplier: default_layer_thickness(),
            np_layers: default_np_layers(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MapgenName {
    V5,
    V6,
    V7,
    Flat,
    Singlenode,
}

impl MapgenName {
    pub fn as_str(self) -> &'static str {
        match self {
            MapgenName::V5 => "v5",
            MapgenName::V6 => "v6",
            MapgenName::V7 => "v7",
            MapgenName::Flat => "flat",
            MapgenName::Singlenode => "singlenode",
        }
    }
}

impl std::str::FromStr for MapgenName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            MapgenName::V5,
            MapgenName::V6,
            MapgenName::V7,
            MapgenName::Flat,
            MapgenName::Singlenode,
        ]
            .into_iter()
            .find(|n| n.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown mapgen '{s}'"))
    }
}

fn default_mg_name() -> MapgenName {
    MapgenName::V7
}
fn default_seed() -> u64 {
    0
}
fn default_water_level() -> i32 {
    1
}
fn default_chunksize() -> i32 {
    5
}
fn default_layer_thickness() -> i32 {
    1
}
fn default_np_layers() -> NoiseParams {
    np(500.0, 500.0, [100.0, 50.0, 100.0], 3663, 5, 0.6).with_far(1.0, 5.0, 0.5, 1.0)
}

/// One entry of the stone layer sequence.
#[derive(Clone, Debug, Deserialize)]
pub struct LayerDef {
    pub name: String,
    #[serde(default)]
    pub param1: u8,
    #[serde(default)]
    pub param2: u8,
    #[serde(default = "default_layer_y_min", alias = "height_min")]
    pub y_min: i32,
    #[serde(default = "default_layer_y_max", alias = "height_max")]
    pub y_max: i32,
    /// Falls back to `layer_default_thickness`.
    #[serde(default)]
    pub thickness: Option<i32>,
}
fn default_layer_y_min() -> i32 {
    -MAX_MAP_GENERATION_LIMIT
}
fn default_layer_y_max() -> i32 {
    MAX_MAP_GENERATION_LIMIT
}

/// Resolved stone layer settings handed to the terrain variants.
#[derive(Clone, Debug)]
pub struct StoneLayersConfig {
    pub layers: Vec<LayerDef>,
    pub default_thickness: i32,
    pub thickness_multiplier: i32,
    pub np_layers: NoiseParams,
}

impl StoneLayersConfig {
    /// Number of slots `layer` takes in the sequence.
    pub fn thickness_of(&self, layer: &LayerDef) -> i32 {
        layer.thickness.unwrap_or(self.default_thickness) * self.thickness_multiplier
    }
}

impl Default for StoneLayersConfig {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            default_thickness: default_layer_thickness(),
            thickness_multiplier: default_layer_thickness(),
            np_layers: default_np_layers(),
        }
    }
}

/// Pipeline stages that may be switched off.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct MapgenFlags(u32);

impl MapgenFlags {
    pub const NONE: MapgenFlags = MapgenFlags(0);
    pub const CAVES: MapgenFlags = MapgenFlags(0x02);
    pub const DUNGEONS: MapgenFlags = MapgenFlags(0x04);
    pub const LIGHT: MapgenFlags = MapgenFlags(0x10);
    pub const DECORATIONS: MapgenFlags = MapgenFlags(0x20);
    pub const BIOMES: MapgenFlags = MapgenFlags(0x40);

    #[inline]
    pub fn contains(self, other: MapgenFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn union(self, other: MapgenFlags) -> MapgenFlags {
        MapgenFlags(self.0 | other.0)
    }

    #[inline]
    pub fn without(self, other: MapgenFlags) -> MapgenFlags {
        MapgenFlags(self.0 & !other.0)
    }
}

impl Default for MapgenFlags {
    fn default() -> Self {
        MapgenFlags::CAVES
            .union(MapgenFlags::DUNGEONS)
            .union(MapgenFlags::LIGHT)
            .union(MapgenFlags::DECORATIONS)
            .union(MapgenFlags::BIOMES)
    }
}

/// `"nocaves"` style entries clear a flag that an earlier entry (or `"defaults"`) set.
impl TryFrom<Vec<String>> for MapgenFlags {
    type Error = String;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        let mut flags = MapgenFlags::NONE;
        for name in names {
            let (negate, bare) = match name.strip_prefix("no") {
                Some(rest) => (true, rest),
                None => (false, name.as_str()),
            };
            let f = match bare {
                "caves" => MapgenFlags::CAVES,
                "dungeons" => MapgenFlags::DUNGEONS,
                "light" => MapgenFlags::LIGHT,
                "decorations" => MapgenFlags::DECORATIONS,
                "biomes" => MapgenFlags::BIOMES,
                "defaults" if !negate => MapgenFlags::default(),
                _ => return Err(format!("unknown mapgen flag '{name}'")),
            };
            flags = if negate {
                flags.without(f)
            } else {
                flags.union(f)
            };
        }
        Ok(flags)
    }
}

fn np(offset: f32, scale: f32, spread: [f32; 3], seed: i32, octaves: u16, persist: f32) -> NoiseParams {
    NoiseParams::new(offset, scale, Vec3::from(spread), seed, octaves, persist, 2.0)
}

#[derive(Clone, Debug, Deserialize)]
pub struct V7Config {
    #[serde(default = "d_true")]
    pub mountains: bool,
    #[serde(default = "d_true")]
    pub ridges: bool,
    #[serde(default = "d_true")]
    pub caverns: bool,
    #[serde(default = "default_np_terrain_base")]
    pub np_terrain_base: NoiseParams,
    #[serde(default = "default_np_terrain_alt")]
    pub np_terrain_alt: NoiseParams,
    #[serde(default = "default_np_terrain_persist")]
    pub np_terrain_persist: NoiseParams,
    #[serde(default = "default_np_height_select")]
    pub np_height_select: NoiseParams,
    #[serde(default = "default_np_filler_depth")]
    pub np_filler_depth: NoiseParams,
    #[serde(default = "default_np_mount_height")]
    pub np_mount_height: NoiseParams,
    #[serde(default = "default_np_ridge_uwater")]
    pub np_ridge_uwater: NoiseParams,
    #[serde(default = "default_np_mountain")]
    pub np_mountain: NoiseParams,
    #[serde(default = "default_np_ridge")]
    pub np_ridge: NoiseParams,
}
fn d_true() -> bool {
    true
}
fn default_np_terrain_base() -> NoiseParams {
    np(4.0, 70.0, [300.0, 300.0, 300.0], 82341, 6, 0.7)
}
fn default_np_terrain_alt() -> NoiseParams {
    np(4.0, 25.0, [600.0, 600.0, 600.0], 5934, 5, 0.6)
}
fn default_np_terrain_persist() -> NoiseParams {
    np(0.6, 0.1, [500.0, 500.0, 500.0], 539, 3, 0.6)
}
fn default_np_height_select() -> NoiseParams {
    np(-0.5, 1.0, [250.0, 250.0, 250.0], 4213, 5, 0.69)
}
fn default_np_filler_depth() -> NoiseParams {
    np(0.0, 1.2, [150.0, 150.0, 150.0], 261, 4, 0.7)
}
fn default_np_mount_height() -> NoiseParams {
    np(100.0, 30.0, [500.0, 500.0, 500.0], 72449, 4, 0.6)
}
fn default_np_ridge_uwater() -> NoiseParams {
    np(0.0, 1.0, [500.0, 500.0, 500.0], 85039, 4, 0.6)
}
fn default_np_mountain() -> NoiseParams {
    np(0.0, 1.0, [250.0, 350.0, 250.0], 5333, 5, 0.68)
}
fn default_np_ridge() -> NoiseParams {
    np(0.0, 1.0, [100.0, 100.0, 100.0], 6467, 4, 0.75)
}
impl Default for V7Config {
    fn default() -> Self {
        Self {
            mountains: true,
            ridges: true,
            caverns: true,
            np_terrain_base: default_np_terrain_base(),
            np_terrain_alt: default_np_terrain_alt(),
            np_terrain_persist: default_np_terrain_persist(),
            np_height_select: default_np_height_select(),
            np_filler_depth: default_np_filler_depth(),
            np_mount_height: default_np_mount_height(),
            np_ridge_uwater: default_np_ridge_uwater(),
            np_mountain: default_np_mountain(),
            np_ridge: default_np_ridge(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct V5Config {
    #[serde(default = "d_true")]
    pub caverns: bool,
    #[serde(default = "default_v5_np_filler_depth")]
    pub np_filler_depth: NoiseParams,
    #[serde(default = "default_v5_np_factor")]
    pub np_factor: NoiseParams,
    #[serde(default = "default_v5_np_height")]
    pub np_height: NoiseParams,
    #[serde(default = "default_v5_np_ground")]
    pub np_ground: NoiseParams,
}
fn default_v5_np_filler_depth() -> NoiseParams {
    np(0.0, 1.0, [150.0, 150.0, 150.0], 261, 4, 0.7)
}
fn default_v5_np_factor() -> NoiseParams {
    np(0.0, 1.0, [250.0, 250.0, 250.0], 920381, 3, 0.45)
}
fn default_v5_np_height() -> NoiseParams {
    np(0.0, 10.0, [250.0, 250.0, 250.0], 84174, 4, 0.5)
}
fn default_v5_np_ground() -> NoiseParams {
    np(0.0, 40.0, [80.0, 80.0, 80.0], 983240, 4, 0.55).with_flags(NoiseFlags::EASED)
}
impl Default for V5Config {
    fn default() -> Self {
        Self {
            caverns: true,
            np_filler_depth: default_v5_np_filler_depth(),
            np_factor: default_v5_np_factor(),
            np_height: default_v5_np_height(),
            np_ground: default_v5_np_ground(),
        }
    }
}

/// The classic variant: two blended height fields, mud, and its own five-way biome split.
#[derive(Clone, Debug, Deserialize)]
pub struct V6Config {
    #[serde(default)]
    pub jungles: bool,
    #[serde(default = "d_true")]
    pub biomeblend: bool,
    #[serde(default = "d_true")]
    pub mudflow: bool,
    #[serde(default)]
    pub snowbiomes: bool,
    #[serde(default = "default_freq_desert")]
    pub freq_desert: f32,
    #[serde(default = "default_freq_beach")]
    pub freq_beach: f32,
    #[serde(default = "default_v6_np_terrain_base")]
    pub np_terrain_base: NoiseParams,
    #[serde(default = "default_v6_np_terrain_higher")]
    pub np_terrain_higher: NoiseParams,
    #[serde(default = "default_v6_np_steepness")]
    pub np_steepness: NoiseParams,
    #[serde(default = "default_v6_np_height_select")]
    pub np_height_select: NoiseParams,
    #[serde(default = "default_v6_np_mud")]
    pub np_mud: NoiseParams,
    #[serde(default = "default_v6_np_beach")]
    pub np_beach: NoiseParams,
    #[serde(default = "default_v6_np_biome")]
    pub np_biome: NoiseParams,
    #[serde(default = "default_v6_np_cave")]
    pub np_cave: NoiseParams,
    #[serde(default = "default_v6_np_humidity")]
    pub np_humidity: NoiseParams,
}
fn default_freq_desert() -> f32 {
    0.45
}
fn default_freq_beach() -> f32 {
    0.15
}
fn default_v6_np_terrain_base() -> NoiseParams {
    np(-4.0, 20.0, [250.0, 250.0, 250.0], 82341, 5, 0.6)
}
fn default_v6_np_terrain_higher() -> NoiseParams {
    np(20.0, 16.0, [500.0, 500.0, 500.0], 85039, 5, 0.6)
}
fn default_v6_np_steepness() -> NoiseParams {
    np(0.85, 0.5, [125.0, 125.0, 125.0], -932, 5, 0.7)
}
fn default_v6_np_height_select() -> NoiseParams {
    np(0.0, 1.0, [250.0, 250.0, 250.0], 4213, 5, 0.69)
}
fn default_v6_np_mud() -> NoiseParams {
    np(4.0, 2.0, [200.0, 200.0, 200.0], 91013, 3, 0.55)
}
fn default_v6_np_beach() -> NoiseParams {
    np(0.0, 1.0, [250.0, 250.0, 250.0], 59420, 3, 0.5)
}
fn default_v6_np_biome() -> NoiseParams {
    np(0.0, 1.0, [500.0, 500.0, 500.0], 9130, 3, 0.5)
}
fn default_v6_np_cave() -> NoiseParams {
    np(6.0, 6.0, [250.0, 250.0, 250.0], 34329, 3, 0.5)
}
fn default_v6_np_humidity() -> NoiseParams {
    np(0.5, 0.5, [500.0, 500.0, 500.0], 72384, 3, 0.5)
}
impl Default for V6Config {
    fn default() -> Self {
        Self {
            jungles: false,
            biomeblend: true,
            mudflow: true,
            snowbiomes: false,
            freq_desert: default_freq_desert(),
            freq_beach: default_freq_beach(),
            np_terrain_base: default_v6_np_terrain_base(),
            np_terrain_higher: default_v6_np_terrain_higher(),
            np_steepness: default_v6_np_steepness(),
            np_height_select: default_v6_np_height_select(),
            np_mud: default_v6_np_mud(),
            np_beach: default_v6_np_beach(),
            np_biome: default_v6_np_biome(),
            np_cave: default_v6_np_cave(),
            np_humidity: default_v6_np_humidity(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct FlatConfig {
    #[serde(default = "default_ground_level")]
    pub ground_level: i32,
    #[serde(default)]
    pub lakes: bool,
    #[serde(default)]
    pub hills: bool,
    #[serde(default = "default_lake_threshold")]
    pub lake_threshold: f32,
    #[serde(default = "default_lake_steepness")]
    pub lake_steepness: f32,
    #[serde(default = "default_hill_threshold")]
    pub hill_threshold: f32,
    #[serde(default = "default_hill_steepness")]
    pub hill_steepness: f32,
    #[serde(default = "default_flat_np_terrain")]
    pub np_terrain: NoiseParams,
    #[serde(default = "default_flat_np_filler_depth")]
    pub np_filler_depth: NoiseParams,
}
fn default_ground_level() -> i32 {
    8
}
fn default_lake_threshold() -> f32 {
    -0.45
}
fn default_lake_steepness() -> f32 {
    48.0
}
fn default_hill_threshold() -> f32 {
    0.45
}
fn default_hill_steepness() -> f32 {
    64.0
}
fn default_flat_np_terrain() -> NoiseParams {
    np(0.0, 1.0, [600.0, 600.0, 600.0], 7244, 5, 0.6)
}
fn default_flat_np_filler_depth() -> NoiseParams {
    np(0.0, 1.2, [150.0, 150.0, 150.0], 261, 3, 0.7)
}
impl Default for FlatConfig {
    fn default() -> Self {
        Self {
            ground_level: default_ground_level(),
            lakes: false,
            hills: false,
            lake_threshold: default_lake_threshold(),
            lake_steepness: default_lake_steepness(),
            hill_threshold: default_hill_threshold(),
            hill_steepness: default_hill_steepness(),
            np_terrain: default_flat_np_terrain(),
            np_filler_depth: default_flat_np_filler_depth(),
        }
    }
}

/// Cave, cavern and dungeon tuning shared by every terrain variant.
#[derive(Clone, Debug, Deserialize)]
pub struct CarverConfig {
    #[serde(default = "default_cave_width")]
    pub cave_width: f32,
    #[serde(default = "default_large_cave_depth")]
    pub large_cave_depth: i32,
    #[serde(default = "default_large_cave_flooded")]
    pub large_cave_flooded: f32,
    #[serde(default = "default_cavern_limit")]
    pub cavern_limit: i32,
    #[serde(default = "default_cavern_taper")]
    pub cavern_taper: i32,
    #[serde(default = "default_cavern_threshold")]
    pub cavern_threshold: f32,
    /// Caverns at or below this level fill with the biome's cave liquid.
    #[serde(default = "default_cavern_liquid_level")]
    pub cavern_liquid_level: i32,
    #[serde(default = "default_dungeon_ymin")]
    pub dungeon_ymin: i32,
    #[serde(default = "default_dungeon_ymax")]
    pub dungeon_ymax: i32,
    #[serde(default = "default_np_cave1")]
    pub np_cave1: NoiseParams,
    #[serde(default = "default_np_cave2")]
    pub np_cave2: NoiseParams,
    #[serde(default = "default_np_cavern")]
    pub np_cavern: NoiseParams,
    #[serde(default = "default_np_cave_amount")]
    pub np_cave_amount: NoiseParams,
    #[serde(default = "default_np_cave_liquids")]
    pub np_cave_liquids: NoiseParams,
    #[serde(default = "default_np_dungeons")]
    pub np_dungeons: NoiseParams,
    #[serde(default = "default_np_dungeon_alt_wall")]
    pub np_dungeon_alt_wall: NoiseParams,
}
fn default_cave_width() -> f32 {
    0.09
}
fn default_large_cave_depth() -> i32 {
    -33
}
fn default_large_cave_flooded() -> f32 {
    0.5
}
fn default_cavern_limit() -> i32 {
    -256
}
fn default_cavern_taper() -> i32 {
    256
}
fn default_cavern_threshold() -> f32 {
    0.7
}
fn default_cavern_liquid_level() -> i32 {
    -MAX_MAP_GENERATION_LIMIT
}
fn default_dungeon_ymin() -> i32 {
    -MAX_MAP_GENERATION_LIMIT
}
fn default_dungeon_ymax() -> i32 {
    MAX_MAP_GENERATION_LIMIT
}
fn default_np_cave1() -> NoiseParams {
    np(0.0, 12.0, [61.0, 61.0, 61.0], 52534, 3, 0.5)
}
fn default_np_cave2() -> NoiseParams {
    np(0.0, 12.0, [67.0, 67.0, 67.0], 10325, 3, 0.5)
}
fn default_np_cavern() -> NoiseParams {
    np(0.0, 1.0, [384.0, 128.0, 384.0], 723, 5, 0.63)
}
fn default_np_cave_amount() -> NoiseParams {
    np(6.0, 6.0, [250.0, 250.0, 250.0], 34329, 3, 0.5)
}
fn default_np_cave_liquids() -> NoiseParams {
    np(0.0, 1.0, [150.0, 150.0, 150.0], 776, 3, 0.6)
}
fn default_np_dungeons() -> NoiseParams {
    np(0.9, 0.5, [500.0, 500.0, 500.0], 0, 2, 0.8)
}
fn default_np_dungeon_alt_wall() -> NoiseParams {
    np(-0.4, 1.0, [40.0, 40.0, 40.0], 32474, 6, 1.1)
}
impl Default for CarverConfig {
    fn default() -> Self {
        Self {
            cave_width: default_cave_width(),
            large_cave_depth: default_large_cave_depth(),
            large_cave_flooded: default_large_cave_flooded(),
            cavern_limit: default_cavern_limit(),
            cavern_taper: default_cavern_taper(),
            cavern_threshold: default_cavern_threshold(),
            cavern_liquid_level: default_cavern_liquid_level(),
            dungeon_ymin: default_dungeon_ymin(),
            dungeon_ymax: default_dungeon_ymax(),
            np_cave1: default_np_cave1(),
            np_cave2: default_np_cave2(),
            np_cavern: default_np_cavern(),
            np_cave_amount: default_np_cave_amount(),
            np_cave_liquids: default_np_cave_liquids(),
            np_dungeons: default_np_dungeons(),
            np_dungeon_alt_wall: default_np_dungeon_alt_wall(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BiomesConfig {
    #[serde(default = "default_np_heat")]
    pub np_heat: NoiseParams,
    #[serde(default = "default_np_humidity")]
    pub np_humidity: NoiseParams,
    #[serde(default = "default_np_heat_blend")]
    pub np_heat_blend: NoiseParams,
    #[serde(default = "default_np_humidity_blend")]
    pub np_humidity_blend: NoiseParams,
    #[serde(default)]
    pub list: Vec<BiomeDef>,
}
fn default_np_heat() -> NoiseParams {
    np(15.0, 30.0, [1000.0, 1000.0, 1000.0], 5349, 3, 0.5)
}
fn default_np_humidity() -> NoiseParams {
    np(50.0, 50.0, [1000.0, 1000.0, 1000.0], 842, 3, 0.5)
}
fn default_np_heat_blend() -> NoiseParams {
    NoiseParams::new(0.0, 1.5, Vec3::new(8.0, 8.0, 8.0), 13, 2, 1.0, 2.0)
}
fn default_np_humidity_blend() -> NoiseParams {
    NoiseParams::new(0.0, 1.5, Vec3::new(8.0, 8.0, 8.0), 90003, 2, 1.0, 2.0)
}
impl Default for BiomesConfig {
    fn default() -> Self {
        Self {
            np_heat: default_np_heat(),
            np_humidity: default_np_humidity(),
            np_heat_blend: default_np_heat_blend(),
            np_humidity_blend: default_np_humidity_blend(),
            list: Vec::new(),
        }
    }
}

/// Seasonal heat/humidity model. Present only when the world runs weather.
#[derive(Clone, Debug, Deserialize)]
pub struct ClimateConfig {
    #[serde(default = "default_year_days")]
    pub year_days: u32,
    #[serde(default = "default_heat_season")]
    pub heat_season: f32,
    #[serde(default = "default_heat_daily")]
    pub heat_daily: f32,
    #[serde(default = "default_heat_width")]
    pub heat_width: f32,
    #[serde(default = "default_heat_height")]
    pub heat_height: f32,
    #[serde(default = "default_hot_core")]
    pub hot_core: i32,
    #[serde(default = "default_humidity_season")]
    pub humidity_season: f32,
    #[serde(default = "default_humidity_daily")]
    pub humidity_daily: f32,
    #[serde(default = "default_humidity_width")]
    pub humidity_width: f32,
    #[serde(default = "default_humidity_days")]
    pub humidity_days: f32,
    #[serde(default = "default_humidity_height")]
    pub humidity_height: f32,
    /// Fraction of the day, 0.0 = midnight.
    #[serde(default = "default_time_of_day")]
    pub time_of_day: f32,
    /// Seconds of game time elapsed.
    #[serde(default)]
    pub total_time: f32,
}
fn default_year_days() -> u32 {
    30
}
fn default_heat_season() -> f32 {
    30.0
}
fn default_heat_daily() -> f32 {
    8.0
}
fn default_heat_width() -> f32 {
    3000.0
}
fn default_heat_height() -> f32 {
    -333.0
}
fn default_hot_core() -> i32 {
    1000
}
fn default_humidity_season() -> f32 {
    30.0
}
fn default_humidity_daily() -> f32 {
    -12.0
}
fn default_humidity_width() -> f32 {
    300.0
}
fn default_humidity_days() -> f32 {
    2.0
}
fn default_humidity_height() -> f32 {
    -333.0
}
fn default_time_of_day() -> f32 {
    0.5
}
impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            year_days: default_year_days(),
            heat_season: default_heat_season(),
            heat_daily: default_heat_daily(),
            heat_width: default_heat_width(),
            heat_height: default_heat_height(),
            hot_core: default_hot_core(),
            humidity_season: default_humidity_season(),
            humidity_daily: default_humidity_daily(),
            humidity_width: default_humidity_width(),
            humidity_days: default_humidity_days(),
            humidity_height: default_humidity_height(),
            time_of_day: default_time_of_day(),
            total_time: 0.0,
        }
    }
}

/// Runtime form of [`MapgenConfig`] with derived values resolved.
#[derive(Clone, Debug)]
pub struct MapgenParams {
    pub name: MapgenName,
    pub seed: u64,
    pub water_level: i32,
    pub chunksize: i32,
    pub flags: MapgenFlags,
    pub v7: V7Config,
    pub v5: V5Config,
    pub v6: V6Config,
    pub flat: FlatConfig,
    pub carvers: CarverConfig,
    pub biomes: BiomesConfig,
    pub climate: Option<ClimateConfig>,
    pub layers: StoneLayersConfig,
}

impl Default for MapgenParams {
    fn default() -> Self {
        Self::from_config(&MapgenConfig::default())
    }
}

impl MapgenParams {
    pub fn from_config(cfg: &MapgenConfig) -> Self {
        let chunksize = cfg.chunksize.clamp(1, 10);
        if chunksize != cfg.chunksize {
            log::warn!(
                target: "mapgen",
                "chunksize {} out of range, using {}",
                cfg.chunksize,
                chunksize
            );
        }
        Self {
            name: cfg.mg_name,
            seed: cfg.seed,
            water_level: cfg.water_level,
            chunksize,
            flags: cfg.flags,
            v7: cfg.v7.clone(),
            v5: cfg.v5.clone(),
            v6: cfg.v6.clone(),
            flat: cfg.flat.clone(),
            carvers: cfg.carvers.clone(),
            biomes: cfg.biomes.clone(),
            climate: cfg.climate.clone(),
            layers: StoneLayersConfig {
                layers: cfg.layers.clone(),
                default_thickness: cfg.layer_default_thickness,
                thickness_multiplier: cfg.layer_thickness_multiplier,
                np_layers: cfg.np_layers.clone(),
            },
        }
    }

    /// Seed handed to noise fields: the low 32 bits of the world seed.
    #[inline]
    pub fn noise_seed(&self) -> i32 {
        self.seed as i32
    }
}

pub fn load_params_from_path(path: &Path) -> Result<MapgenParams, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    let cfg: MapgenConfig = toml::from_str(&s)?;
    Ok(MapgenParams::from_config(&cfg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg: MapgenConfig = toml::from_str("").unwrap();
        let p = MapgenParams::from_config(&cfg);
        assert_eq!(p.name, MapgenName::V7);
        assert_eq!(p.water_level, 1);
        assert_eq!(p.chunksize, 5);
        assert!(p.flags.contains(MapgenFlags::CAVES));
        assert!(p.flags.contains(MapgenFlags::LIGHT));
        assert_eq!(p.v7.np_terrain_base.seed, 82341);
        assert!(p.climate.is_none());
    }

    #[test]
    fn flags_parse_and_negate() {
        let cfg: MapgenConfig =
            toml::from_str("flags = [\"defaults\", \"nocaves\"]\nmg_name = \"flat\"").unwrap();
        assert!(!cfg.flags.contains(MapgenFlags::CAVES));
        assert!(cfg.flags.contains(MapgenFlags::DUNGEONS));
        assert_eq!(cfg.mg_name, MapgenName::Flat);

        let bad: Result<MapgenConfig, _> = toml::from_str("flags = [\"lava\"]");
        assert!(bad.is_err());
    }

    #[test]
    fn chunksize_is_clamped() {
        let cfg = MapgenConfig {
            chunksize: 40,
            ..MapgenConfig::default()
        };
        assert_eq!(MapgenParams::from_config(&cfg).chunksize, 10);
    }

    #[test]
    fn noise_section_overrides() {
        let cfg: MapgenConfig = toml::from_str(
            r#"
            seed = 42
            [v7]
            ridges = false
            [v7.np_terrain_base]
            offset = 10.0
            scale = 5.0
            spread = [100.0, 100.0, 100.0]
            seed = 7
            octaves = 2
            "#,
        )
        .unwrap();
        assert_eq!(cfg.seed, 42);
        assert!(!cfg.v7.ridges);
        assert!(cfg.v7.mountains);
        assert_eq!(cfg.v7.np_terrain_base.offset, 10.0);
        assert_eq!(cfg.v7.np_terrain_base.octaves, 2);
        assert_eq!(cfg.v7.np_terrain_alt.seed, 5934);
    }

    #[test]
    fn stone_layers_parse_with_thickness_defaults() {
        let cfg: MapgenConfig = toml::from_str(
            r#"
            layer_default_thickness = 2
            layer_thickness_multiplier = 3

            [[layers]]
            name = "mapgen_stone"

            [[layers]]
            name = "mapgen_desert_stone"
            height_max = -100
            thickness = 1
            "#,
        )
        .unwrap();
        let p = MapgenParams::from_config(&cfg);
        assert_eq!(p.layers.layers.len(), 2);
        assert_eq!(p.layers.thickness_of(&p.layers.layers[0]), 6);
        assert_eq!(p.layers.thickness_of(&p.layers.layers[1]), 3);
        assert_eq!(p.layers.layers[0].y_min, -MAX_MAP_GENERATION_LIMIT);
        assert_eq!(p.layers.layers[1].y_max, -100);
        assert_eq!(p.layers.np_layers.seed, 3663);
    }

    #[test]
    fn v6_is_selectable_by_name() {
        let cfg: MapgenConfig = toml::from_str("mg_name = \"v6\"\n[v6]\nsnowbiomes = true").unwrap();
        assert_eq!(cfg.mg_name, MapgenName::V6);
        assert!(cfg.v6.snowbiomes);
        assert!(cfg.v6.mudflow);
        assert_eq!("V6".parse::<MapgenName>(), Ok(MapgenName::V6));
        assert_eq!(MapgenName::V6.as_str(), "v6");
    }
}
