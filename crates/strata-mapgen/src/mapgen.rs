use std::error::Error;
use std::sync::Arc;

use strata_geom::{MAP_BLOCKSIZE, MAX_MAP_GENERATION_LIMIT, V3i};
use strata_lighting::{LightingParams, calc_lighting, set_lighting};
use strata_nodes::{CONTENT_IGNORE, ContentId, LIGHT_SUN, Node, NodeRegistry};
use strata_noise::{NoiseMap, NoiseParams};
use strata_voxel::VoxelArea;

use crate::biome::{BiomeGen, BiomeManager};
use crate::climate::{ClimateFeed, SeasonalClimate};
use crate::config::{BiomesConfig, CarverConfig, MapgenFlags, MapgenName, MapgenParams};
use crate::generation::{
    CavernsNoise, CavesNoiseIntersection, FlatGen, RandomWalkParams, StoneLayers, V5Gen, V6Gen, V7Gen, dust_top_nodes,
    generate_biomes, generate_caves_random_walk, generate_dungeons, update_heightmap, update_liquid,
};
use crate::job::GenerationJob;
use crate::placer::Placer;

/// Node ids every variant needs, resolved once from the registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ContentIds {
    pub stone: ContentId,
    pub water_source: ContentId,
    pub river_water_source: ContentId,
    pub lava_source: ContentId,
    pub ice: ContentId,
    /// `CONTENT_IGNORE` when unregistered; dungeons then fall back to biome stone.
    pub cobble: ContentId,
    pub mossycobble: ContentId,
    pub stair_cobble: ContentId,
}

impl ContentIds {
    /// Stone and water are required. Every other id falls back to a related node.
    pub fn resolve(reg: &NodeRegistry) -> Result<Self, Box<dyn Error>> {
        let required = |name: &str| -> Result<ContentId, Box<dyn Error>> {
            reg.id_of(name)
                .ok_or_else(|| format!("mapgen node '{name}' is not registered").into())
        };
        let optional = |name: &str, fallback: ContentId| {
            reg.id_of(name).unwrap_or_else(|| {
                log::warn!(target: "mapgen", "mapgen node '{name}' is not registered, using fallback");
                fallback
            })
        };
        let stone = required("mapgen_stone")?;
        let water_source = required("mapgen_water_source")?;
        let cobble = reg.id_of("mapgen_cobble").unwrap_or(CONTENT_IGNORE);
        Ok(Self {
            stone,
            water_source,
            river_water_source: optional("mapgen_river_water_source", water_source),
            lava_source: optional("mapgen_lava_source", water_source),
            ice: optional("mapgen_ice", water_source),
            cobble,
            mossycobble: reg.id_of("mapgen_mossycobble").unwrap_or(cobble),
            stair_cobble: reg.id_of("mapgen_stair_cobble").unwrap_or(cobble),
        })
    }
}

/// State shared by every pass of one worker's pipeline.
pub struct MapgenCommon {
    pub seed: i32,
    pub water_level: i32,
    pub flags: MapgenFlags,
    /// Node extent of one mapchunk.
    pub csize: V3i,
    pub ids: ContentIds,
    pub registry: Arc<NodeRegistry>,
    pub biomegen: BiomeGen,
    pub noise_filler_depth: NoiseMap,
    pub climate: Option<Arc<dyn ClimateFeed>>,
}

impl MapgenCommon {
    /// Integer climate heat of the column at `p`; 0 without a climate feed.
    pub fn column_heat(&self, p: V3i) -> i32 {
        self.climate
            .as_ref()
            .and_then(|c| c.heat(p))
            .map_or(0, |h| h as i32)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ShapeReport {
    /// Highest y holding stone after shaping, `-MAX_MAP_GENERATION_LIMIT` when none.
    pub stone_surface_max_y: i32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkReport {
    pub stone_surface_max_y: i32,
    pub near_cavern: bool,
    pub dust_placed: usize,
    pub placer_nodes: usize,
    pub relit: bool,
}

/// Carver state reused across chunks.
pub struct Carvers {
    pub cfg: CarverConfig,
    pub caves: CavesNoiseIntersection,
    pub caverns: CavernsNoise,
}

impl Carvers {
    pub fn new(cfg: &CarverConfig, seed: i32, csize: V3i) -> Self {
        Self {
            caves: CavesNoiseIntersection::new(cfg, seed, csize),
            caverns: CavernsNoise::new(cfg, seed, csize),
            cfg: cfg.clone(),
        }
    }
}

/// The terrain variant of a pipeline.
pub enum MapgenKind {
    V5(V5Gen),
    V6(V6Gen),
    V7(V7Gen),
    Flat(FlatGen),
    Singlenode,
}

impl MapgenKind {
    pub fn new(params: &MapgenParams, registry: &NodeRegistry, ids: &ContentIds, seed: i32, csize: V3i) -> Self {
        match params.name {
            MapgenName::V5 => MapgenKind::V5(V5Gen::new(&params.v5, seed, csize)),
            MapgenName::V6 => MapgenKind::V6(V6Gen::new(&params.v6, &params.biomes, registry, ids.stone, seed, csize)),
            MapgenName::V7 => MapgenKind::V7(V7Gen::new(&params.v7, seed, csize)),
            MapgenName::Flat => MapgenKind::Flat(FlatGen::new(&params.flat, seed, csize)),
            MapgenName::Singlenode => MapgenKind::Singlenode,
        }
    }

    pub fn name(&self) -> MapgenName {
        match self {
            MapgenKind::V5(_) => MapgenName::V5,
            MapgenKind::V6(_) => MapgenName::V6,
            MapgenKind::V7(_) => MapgenName::V7,
            MapgenKind::Flat(_) => MapgenName::Flat,
            MapgenKind::Singlenode => MapgenName::Singlenode,
        }
    }

    fn filler_depth_params(params: &MapgenParams) -> NoiseParams {
        match params.name {
            MapgenName::V5 => params.v5.np_filler_depth.clone(),
            MapgenName::Flat => params.flat.np_filler_depth.clone(),
            MapgenName::V6 | MapgenName::V7 | MapgenName::Singlenode => params.v7.np_filler_depth.clone(),
        }
    }

    fn has_caverns(&self) -> bool {
        match self {
            MapgenKind::V5(g) => g.config().caverns,
            MapgenKind::V7(g) => g.config().caverns,
            MapgenKind::V6(_) | MapgenKind::Flat(_) | MapgenKind::Singlenode => false,
        }
    }

    /// Fills the unknown cells of the chunk and its vertical skirt with stone, water
    /// and air. v5 and v7 take their solid cells from `layers`.
    pub fn shape(&mut self, common: &MapgenCommon, layers: &mut StoneLayers, job: &mut GenerationJob) -> ShapeReport {
        let stone_surface_max_y = match self {
            MapgenKind::V5(g) => g.generate_base_terrain(common, layers, job),
            MapgenKind::V6(g) => g.generate_ground(common, job),
            MapgenKind::V7(g) => g.generate_terrain(common, layers, job),
            MapgenKind::Flat(g) => g.generate_terrain(common, job),
            MapgenKind::Singlenode => {
                let area = VoxelArea::new(job.node_min(), job.node_max());
                for p in area.iter() {
                    let i = job.vm.index_of(p);
                    if job.vm.node_at(i).is_ignore() {
                        job.vm.set_node_at(i, Node::AIR);
                    }
                }
                -MAX_MAP_GENERATION_LIMIT
            }
        };
        ShapeReport { stone_surface_max_y }
    }

    /// Runs noise caves, caverns and random-walk caves. Returns whether the chunk came
    /// close to a cavern. v6 cuts its caves while aging the terrain instead.
    pub fn carve(
        &self,
        carvers: &mut Carvers,
        common: &MapgenCommon,
        job: &mut GenerationJob,
        report: &ShapeReport,
    ) -> bool {
        if matches!(self, MapgenKind::Singlenode | MapgenKind::V6(_)) {
            return false;
        }
        let max_stone_y = report.stone_surface_max_y;
        let nmin = job.node_min();
        if nmin.y > max_stone_y {
            log::debug!(target: "mapgen", "carvers skipped at {nmin:?}: above stone surface {max_stone_y}");
            return false;
        }
        let biomes = common.biomegen.manager();

        // tunnels first, caverns confuse them
        carvers.caves.generate_caves(job, biomes);

        let near_cavern = self.has_caverns()
            && nmin.y <= carvers.cfg.cavern_limit
            && carvers.caverns.generate_caverns(job, biomes, common.ids.lava_source);

        // large caves next to caverns spill liquid into them
        let large_cave_ymax = if near_cavern {
            -MAX_MAP_GENERATION_LIMIT
        } else {
            carvers.cfg.large_cave_depth
        };
        let params = RandomWalkParams {
            registry: &common.registry,
            biomegen: Some(&common.biomegen),
            np_cave_liquids: &carvers.cfg.np_cave_liquids,
            seed: common.seed,
            water_level: common.water_level,
            c_water_source: common.ids.water_source,
            c_lava_source: common.ids.lava_source,
            large_cave_flooded: carvers.cfg.large_cave_flooded,
        };
        generate_caves_random_walk(&params, &carvers.cfg.np_cave_amount, job, max_stone_y, large_cave_ymax);
        near_cavern
    }

    /// Suggested spawn y for column (`x`, `z`), `MAX_MAP_GENERATION_LIMIT` when unsuitable.
    pub fn ground_level_at_point(&self, water_level: i32, x: i32, z: i32) -> i32 {
        match self {
            MapgenKind::V5(g) => g.ground_level_at_point(water_level, x, z),
            MapgenKind::V6(g) => g.ground_level_at_point(x, z),
            MapgenKind::V7(g) => g.ground_level_at_point(water_level, x, z),
            MapgenKind::Flat(g) => g.ground_level_at_point(water_level, x, z),
            MapgenKind::Singlenode => 0,
        }
    }
}

/// One worker's generation pipeline.
///
/// Noise buffers are sized for a single mapchunk and reused from chunk to chunk, so a
/// `Mapgen` is owned by exactly one thread.
pub struct Mapgen {
    pub common: MapgenCommon,
    kind: MapgenKind,
    layers: StoneLayers,
    carvers: Carvers,
    placers: Vec<Arc<dyn Placer>>,
    biomes_cfg: BiomesConfig,
}

impl Mapgen {
    pub fn new(
        params: &MapgenParams,
        registry: Arc<NodeRegistry>,
        biomes: Arc<BiomeManager>,
    ) -> Result<Self, Box<dyn Error>> {
        let seed = params.noise_seed();
        let csize = V3i::splat(params.chunksize * MAP_BLOCKSIZE);
        let ids = ContentIds::resolve(&registry)?;
        let climate: Option<Arc<dyn ClimateFeed>> = params
            .climate
            .as_ref()
            .map(|c| Arc::new(SeasonalClimate::new(c.clone(), &params.biomes, seed)) as Arc<dyn ClimateFeed>);
        let biomegen = BiomeGen::new(biomes, &params.biomes, seed, csize, climate.clone());
        let filler = MapgenKind::filler_depth_params(params);
        let (sx, sz) = (csize.x as usize, csize.z as usize);
        let kind = MapgenKind::new(params, &registry, &ids, seed, csize);
        let layers = StoneLayers::new(&params.layers, &registry, Node::new(ids.stone), seed, csize);

        log::debug!(
            target: "mapgen",
            "mapgen {} seed {} chunk {:?}",
            params.name.as_str(),
            seed,
            csize
        );
        Ok(Self {
            common: MapgenCommon {
                seed,
                water_level: params.water_level,
                flags: params.flags,
                csize,
                ids,
                registry,
                biomegen,
                noise_filler_depth: NoiseMap::new_2d(filler, seed, sx, sz),
                climate,
            },
            kind,
            layers,
            carvers: Carvers::new(&params.carvers, seed, csize),
            placers: Vec::new(),
            biomes_cfg: params.biomes.clone(),
        })
    }

    /// Replaces the climate feed consulted for biome choice and ice.
    pub fn with_climate(mut self, climate: Arc<dyn ClimateFeed>) -> Self {
        let c = &mut self.common;
        let mgr = c.biomegen.manager().clone();
        c.biomegen = BiomeGen::new(mgr, &self.biomes_cfg, c.seed, c.csize, Some(climate.clone()));
        c.climate = Some(climate);
        self
    }

    pub fn add_placer(&mut self, placer: Arc<dyn Placer>) {
        self.placers.push(placer);
    }

    pub fn kind(&self) -> &MapgenKind {
        &self.kind
    }

    pub fn ground_level_at_point(&self, x: i32, z: i32) -> i32 {
        self.kind.ground_level_at_point(self.common.water_level, x, z)
    }

    fn lighting_params(&self) -> LightingParams {
        LightingParams {
            water_level: self.common.water_level,
            propagate_shadow: true,
        }
    }

    /// Generates the job's mapchunk in place.
    pub fn make_chunk(&mut self, job: &mut GenerationJob) -> ChunkReport {
        assert_eq!(
            job.chunk_size(),
            self.common.csize,
            "job chunk does not match the pipeline's chunk size"
        );
        let nmin = job.node_min();
        let nmax = job.node_max();
        let flags = self.common.flags;
        let mut report = ChunkReport::default();

        let shape = self.kind.shape(&self.common, &mut self.layers, job);
        report.stone_surface_max_y = shape.stone_surface_max_y;

        if let MapgenKind::Singlenode = self.kind {
            update_liquid(job, nmin, nmax);
            if flags.contains(MapgenFlags::LIGHT) {
                set_lighting(&mut job.vm, &VoxelArea::new(nmin, nmax), LIGHT_SUN);
            }
            log::debug!(target: "mapgen", "singlenode chunk {nmin:?}..{nmax:?}");
            return report;
        }

        update_heightmap(job, nmin, nmax);
        self.common.biomegen.calc_biome_noise(nmin);
        if let MapgenKind::V6(g) = &self.kind {
            g.age_terrain(
                &self.common,
                &self.carvers.cfg,
                job,
                shape.stone_surface_max_y,
                flags.contains(MapgenFlags::CAVES),
            );
            update_heightmap(job, nmin, nmax);
        } else {
            if flags.contains(MapgenFlags::BIOMES) {
                generate_biomes(&mut self.common, job);
            }
            if flags.contains(MapgenFlags::CAVES) {
                report.near_cavern = self.kind.carve(&mut self.carvers, &self.common, job, &shape);
            }
        }

        if flags.contains(MapgenFlags::DUNGEONS) {
            generate_dungeons(
                &self.carvers.cfg,
                self.common.seed,
                &self.common.ids,
                &self.common.biomegen,
                job,
                shape.stone_surface_max_y,
            );
        }

        let v6 = matches!(self.kind, MapgenKind::V6(_));
        if flags.contains(MapgenFlags::BIOMES) && !v6 {
            report.dust_placed = dust_top_nodes(
                job,
                self.common.biomegen.manager(),
                self.common.water_level,
                self.common.ids.ice,
            );
        }

        let (full_min, full_max) = (job.full_node_min(), job.full_node_max());
        update_liquid(job, full_min, full_max);
        if let MapgenKind::V6(g) = &self.kind {
            g.grow_grass(&self.common, job);
        }

        let sun_area = VoxelArea::new(nmin - V3i::new(0, 1, 0), nmax + V3i::new(0, 1, 0));
        let spread_area = VoxelArea::new(full_min, full_max);
        if flags.contains(MapgenFlags::LIGHT) {
            calc_lighting(&mut job.vm, &self.common.registry, &sun_area, &spread_area, self.lighting_params());
        }

        if flags.contains(MapgenFlags::DECORATIONS) && !self.placers.is_empty() {
            let blockseed = job.blockseed();
            for placer in &self.placers {
                let out = placer.place(job, blockseed, nmin, nmax);
                log::trace!(target: "mapgen", "placer {} put {} nodes", placer.name(), out.nodes_placed);
                report.placer_nodes += out.nodes_placed;
            }
            if job.lighting_dirty && flags.contains(MapgenFlags::LIGHT) {
                calc_lighting(&mut job.vm, &self.common.registry, &sun_area, &spread_area, self.lighting_params());
                job.lighting_dirty = false;
                report.relit = true;
            }
        }

        log::debug!(
            target: "mapgen",
            "{} chunk {:?}..{:?}: stone up to {}, {} notify events, {} liquid queued",
            self.kind.name().as_str(),
            nmin,
            nmax,
            report.stone_surface_max_y,
            job.notify.events().len(),
            job.transforming_liquid.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_ids_fall_back() {
        let reg = NodeRegistry::mapgen_defaults().unwrap();
        let ids = ContentIds::resolve(&reg).unwrap();
        assert_eq!(ids.stone, reg.id_of("mapgen_stone").unwrap());
        assert_eq!(ids.lava_source, reg.id_of("mapgen_lava_source").unwrap());
        assert_eq!(ids.cobble, reg.id_of("mapgen_cobble").unwrap());

        let bare = NodeRegistry::from_toml_str(
            r#"
            [[nodes]]
            name = "mapgen_stone"
            [[nodes]]
            name = "mapgen_water_source"
            "#,
        )
        .unwrap();
        let ids = ContentIds::resolve(&bare).unwrap();
        assert_eq!(ids.lava_source, ids.water_source);
        assert_eq!(ids.ice, ids.water_source);
        assert_eq!(ids.cobble, CONTENT_IGNORE);
        assert_eq!(ids.stair_cobble, CONTENT_IGNORE);
    }

    #[test]
    fn missing_stone_is_an_error() {
        let reg = NodeRegistry::from_toml_str("[[nodes]]\nname = \"mapgen_water_source\"\n").unwrap();
        assert!(ContentIds::resolve(&reg).is_err());
    }

    #[test]
    fn heat_without_climate_is_zero() {
        let reg = Arc::new(NodeRegistry::mapgen_defaults().unwrap());
        let params = MapgenParams::default();
        let biomes = Arc::new(BiomeManager::from_config(&params.biomes, &reg).unwrap());
        let mg = Mapgen::new(&params, reg, biomes).unwrap();
        assert_eq!(mg.common.column_heat(V3i::new(5, 10, -5)), 0);
        assert_eq!(mg.kind().name(), MapgenName::V7);
    }
}
