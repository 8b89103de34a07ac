//! Terrain shaping, biomes, carvers and the per-chunk generation pipeline.
#![forbid(unsafe_code)]

pub mod biome;
pub mod climate;
pub mod config;
pub mod generation;
pub mod job;
pub mod mapgen;
pub mod notify;
pub mod placer;

pub use biome::{BIOME_NONE, BiomeConfigError, BiomeDef, BiomeGen, BiomeId, BiomeManager, BiomeRecord};
pub use climate::{ClimateFeed, SeasonalClimate};
pub use config::{
    CarverConfig, ClimateConfig, FlatConfig, LayerDef, MapgenConfig, MapgenFlags, MapgenName, MapgenParams,
    StoneLayersConfig, V5Config, V6Config, V7Config, load_params_from_path,
};
pub use generation::StoneLayers;
pub use job::{GenerationJob, LiquidQueue};
pub use mapgen::{ChunkReport, ContentIds, Mapgen, MapgenCommon, MapgenKind, ShapeReport};
pub use notify::{GenNotifier, GenNotifyEvent, GenNotifyType};
pub use placer::{PlacementOutcome, Placer};
