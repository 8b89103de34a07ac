mod biomes;
pub mod caverns;
pub mod caves;
pub mod dungeons;
mod dust;
pub mod flat;
pub mod layers;
mod liquid;
pub mod surface;
pub mod v5;
pub mod v6;
pub mod v7;

pub use biomes::generate_biomes;
pub use caverns::CavernsNoise;
pub use caves::{CavesNoiseIntersection, CavesRandomWalk, FLAG_CAVE, RandomWalkParams, generate_caves_random_walk};
pub use dungeons::{DungeonGen, DungeonParams, generate_dungeons};
pub use dust::dust_top_nodes;
pub use flat::FlatGen;
pub use layers::StoneLayers;
pub use liquid::update_liquid;
pub use surface::{find_ground_level, find_liquid_surface, get_surfaces, update_heightmap};
pub use v5::V5Gen;
pub use v6::{BiomeV6, V6Gen};
pub use v7::V7Gen;
