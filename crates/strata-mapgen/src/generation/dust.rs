use strata_geom::V3i;
use strata_nodes::{CONTENT_AIR, CONTENT_IGNORE, ContentId, DrawType, Node};

use crate::biome::BiomeManager;
use crate::job::GenerationJob;

/// Drops each column's biome dust onto the first solid cube below open air.
///
/// A column is dusted only when the top of the padded buffer is air, or unknown with
/// air just above the chunk; otherwise the chunk above supplies its own dust later.
pub fn dust_top_nodes(job: &mut GenerationJob, biomes: &BiomeManager, water_level: i32, c_ice: ContentId) -> usize {
    let nmin = job.node_min();
    let nmax = job.node_max();
    if nmax.y < water_level {
        return 0;
    }
    let full_max_y = job.full_node_max().y;
    let reg = job.registry.clone();
    let mut placed = 0usize;
    let mut index = 0usize;

    for z in nmin.z..=nmax.z {
        for x in nmin.x..=nmax.x {
            let biome = biomes.get(job.biomemap[index]);
            index += 1;
            if biome.c_dust == CONTENT_IGNORE {
                continue;
            }

            let y_start = match job.vm.get_node(V3i::new(x, full_max_y, z)).content {
                CONTENT_AIR => full_max_y - 1,
                CONTENT_IGNORE if job.vm.get_node(V3i::new(x, nmax.y + 1, z)).content == CONTENT_AIR => nmax.y,
                _ => continue,
            };

            let mut y = y_start;
            while y > nmin.y - 1 && job.vm.get_node(V3i::new(x, y, z)).content == CONTENT_AIR {
                y -= 1;
            }

            let c = job.vm.get_node(V3i::new(x, y, z)).content;
            let f = reg.features_of(c);
            if f.buildable_to || c == c_ice || c == biome.c_dust || !f.walkable {
                continue;
            }
            if matches!(f.drawtype, DrawType::Normal | DrawType::Glasslike) {
                job.vm.set_node(V3i::new(x, y + 1, z), Node::new(biome.c_dust));
                placed += 1;
            }
        }
    }
    placed
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::biome::BiomeDef;
    use strata_geom::BlockPos;
    use strata_nodes::NodeRegistry;

    #[test]
    fn dust_lands_on_stone_but_not_ice() {
        let reg = Arc::new(NodeRegistry::mapgen_defaults().unwrap());
        let mut def = BiomeDef::named("snowy");
        def.node_dust = Some("mapgen_snow".into());
        let biomes = BiomeManager::from_defs(&[def], &reg).unwrap();
        let snow = reg.id_of("mapgen_snow").unwrap();
        let stone = Node::new(reg.id_of("mapgen_stone").unwrap());
        let ice = reg.id_of("mapgen_ice").unwrap();

        let mut job = GenerationJob::new(reg.clone(), 1, BlockPos::new(0, 0, 0), BlockPos::new(0, 0, 0), BlockPos::new(0, 0, 0));
        for z in 0..16 {
            for x in 0..16 {
                for y in -16..32 {
                    let n = if y <= 4 { stone } else { Node::AIR };
                    job.vm.set_node(V3i::new(x, y, z), n);
                }
            }
        }
        job.vm.set_node(V3i::new(3, 4, 3), Node::new(ice));
        job.biomemap.fill(1);

        let placed = dust_top_nodes(&mut job, &biomes, 1, ice);
        assert_eq!(placed, 255);
        assert_eq!(job.vm.get_node(V3i::new(0, 5, 0)).content, snow);
        assert!(job.vm.get_node(V3i::new(3, 5, 3)).is_air());

        // a second pass finds dust already in place
        assert_eq!(dust_top_nodes(&mut job, &biomes, 1, ice), 0);
    }
}
