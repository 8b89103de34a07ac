use strata_geom::V3i;
use strata_nodes::{CONTENT_AIR, Node};

use crate::biome::{BIOME_NONE, BiomeId, BiomeRecord};
use crate::job::GenerationJob;
use crate::mapgen::MapgenCommon;

/// Replaces shaped stone and water with each column's biome materials.
///
/// Columns are scanned downwards from the chunk top. The biome is recomputed at every
/// stone or water surface and whenever the scan drops below the current biome's floor.
/// Expects `common.biomegen` noise to be calculated for this chunk.
pub fn generate_biomes(common: &mut MapgenCommon, job: &mut GenerationJob) {
    let nmin = job.node_min();
    let nmax = job.node_max();
    let water_level = common.water_level;
    let ids = common.ids;
    let filler = common
        .noise_filler_depth
        .perlin_map_2d(nmin.x as f32, nmin.z as f32, None)
        .to_vec();
    let biomegen = &common.biomegen;
    let mut index = 0usize;

    for z in nmin.z..=nmax.z {
        for x in nmin.x..=nmax.x {
            let mut biome: Option<&BiomeRecord> = None;
            let mut water_biome: BiomeId = BIOME_NONE;
            let mut depth_top = 0i32;
            let mut base_filler = 0i32;
            let mut depth_water_top = 0i32;
            let mut depth_riverbed = 0i32;
            let mut biome_y_min = biomegen.next_transition_y(i32::MAX);

            let c_above = job.vm.get_node(V3i::new(x, nmax.y + 1, z)).content;
            let mut air_above = c_above == CONTENT_AIR;
            let mut river_water_above = c_above == ids.river_water_source;
            let mut water_above = c_above == ids.water_source || c_above == ids.ice || river_water_above;

            job.biomemap[index] = BIOME_NONE;

            // Air or water above enables top/filler placement; anything else forces
            // stone by starting past any filler depth.
            let mut nplaced: i32 = if air_above || water_above { 0 } else { i32::MAX };

            let heat = common.column_heat(V3i::new(x, nmax.y, z));

            for y in (nmin.y..=nmax.y).rev() {
                let p = V3i::new(x, y, z);
                let c = job.vm.get_node(p).content;
                let is_stone = c == ids.stone;
                let is_stone_surface = is_stone && (air_above || water_above || biome.is_none() || y < biome_y_min);
                let is_water_surface = (c == ids.water_source || c == ids.river_water_source)
                    && (air_above || biome.is_none() || y < biome_y_min);

                if is_stone_surface || is_water_surface {
                    if biome.is_none() || y < biome_y_min {
                        biome = Some(biomegen.biome_at_index(index, p));
                        while y < biome_y_min {
                            biome_y_min = biomegen.next_transition_y(biome_y_min);
                        }
                    }
                    if let Some(b) = biome {
                        if job.biomemap[index] == BIOME_NONE && is_stone_surface {
                            job.biomemap[index] = b.index;
                        }
                        if water_biome == BIOME_NONE && is_water_surface {
                            water_biome = b.index;
                        }
                        depth_top = b.depth_top;
                        base_filler = (depth_top as f32 + b.depth_filler as f32 + filler[index]).max(0.0) as i32;
                        depth_water_top = b.depth_water_top;
                        depth_riverbed = b.depth_riverbed;
                    }
                }

                let Some(b) = biome else {
                    // Nothing painted until the first surface sets a biome.
                    if c == CONTENT_AIR {
                        nplaced = 0;
                        air_above = true;
                        water_above = false;
                    }
                    continue;
                };

                if is_stone {
                    let c_below = job.vm.get_node(p - V3i::new(0, 1, 0)).content;
                    // Top and filler must rest on something solid.
                    if c_below == CONTENT_AIR || c_below == ids.water_source || c_below == ids.river_water_source {
                        nplaced = i32::MAX;
                    }

                    let placed = if river_water_above {
                        if nplaced < depth_riverbed {
                            nplaced += 1;
                            b.c_riverbed
                        } else {
                            nplaced = i32::MAX;
                            river_water_above = false;
                            b.c_stone
                        }
                    } else if nplaced < depth_top {
                        nplaced += 1;
                        if y >= water_level && heat < -3 { b.c_top_cold } else { b.c_top }
                    } else if nplaced < base_filler {
                        nplaced += 1;
                        b.c_filler
                    } else {
                        nplaced = i32::MAX;
                        b.c_stone
                    };
                    job.vm.set_node(p, Node::new(placed));
                    air_above = false;
                    water_above = false;
                } else if c == ids.water_source {
                    let ice = heat < 0 && y > water_level + heat / 4;
                    let placed = if ice {
                        b.c_ice
                    } else if y > water_level - depth_water_top {
                        b.c_water_top
                    } else {
                        b.c_water
                    };
                    job.vm.set_node(p, Node::new(placed));
                    nplaced = 0;
                    air_above = false;
                    water_above = true;
                } else if c == ids.river_water_source {
                    job.vm.set_node(p, Node::new(b.c_river_water));
                    nplaced = 0;
                    air_above = false;
                    water_above = true;
                    river_water_above = true;
                } else if c == CONTENT_AIR {
                    nplaced = 0;
                    air_above = true;
                    water_above = false;
                } else {
                    // overgenerated or foreign content
                    nplaced = i32::MAX;
                    air_above = false;
                    water_above = false;
                }
            }

            if job.biomemap[index] == BIOME_NONE && water_biome != BIOME_NONE {
                job.biomemap[index] = water_biome;
            }
            index += 1;
        }
    }
}
