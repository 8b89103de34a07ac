use strata_geom::V3i;
use strata_nodes::{CONTENT_IGNORE, NodeRegistry};
use strata_voxel::{Direction, VoxelBuffer};

use crate::job::GenerationJob;

/// True when a known horizontal neighbour of `p` is floodable and not itself liquid.
fn horizontally_flowable(vm: &VoxelBuffer, reg: &NodeRegistry, p: V3i) -> bool {
    Direction::HORIZONTAL.iter().any(|d| {
        let n = vm.get_node_or_ignore(p + d.offset());
        if n.content == CONTENT_IGNORE {
            return false;
        }
        let f = reg.features_of(n.content);
        f.floodable && !f.is_liquid()
    })
}

/// Queues liquid nodes that can flow once the chunk is live: the top of each liquid
/// column with a floodable side, and the bottom of each column resting on something
/// floodable. The outermost ring of columns is skipped.
pub fn update_liquid(job: &mut GenerationJob, nmin: V3i, nmax: V3i) {
    let reg = job.registry.clone();
    let vm = &job.vm;
    let queue = &mut job.transforming_liquid;
    let mut pushed = 0usize;

    for z in nmin.z + 1..nmax.z {
        for x in nmin.x + 1..nmax.x {
            let mut was_ignored = true;
            let mut was_liquid = false;
            let mut was_checked = false;
            let mut was_pushed = false;

            for y in (nmin.y..=nmax.y).rev() {
                let p = V3i::new(x, y, z);
                let c = vm.get_node(p).content;
                let is_ignored = c == CONTENT_IGNORE;
                let is_liquid = reg.features_of(c).is_liquid();

                if is_ignored || was_ignored || is_liquid == was_liquid {
                    was_checked = false;
                    was_pushed = false;
                } else if is_liquid {
                    // topmost node of a liquid column
                    let is_pushed = horizontally_flowable(vm, &reg, p) && queue.push(p);
                    pushed += usize::from(is_pushed);
                    was_checked = true;
                    was_pushed = is_pushed;
                } else {
                    // first node below a liquid column
                    let above = p + V3i::new(0, 1, 0);
                    if !was_pushed
                        && (reg.features_of(c).floodable
                            || (!was_checked && horizontally_flowable(vm, &reg, above)))
                        && queue.push(above)
                    {
                        pushed += 1;
                    }
                }

                was_liquid = is_liquid;
                was_ignored = is_ignored;
            }
        }
    }
    log::trace!(target: "mapgen", "queued {pushed} transforming liquids");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use strata_geom::BlockPos;
    use strata_nodes::Node;

    fn job() -> GenerationJob {
        let reg = Arc::new(NodeRegistry::mapgen_defaults().unwrap());
        GenerationJob::new(reg, 1, BlockPos::new(0, 0, 0), BlockPos::new(0, 0, 0), BlockPos::new(0, 0, 0))
    }

    fn fill(job: &mut GenerationJob, min: V3i, max: V3i, n: Node) {
        for z in min.z..=max.z {
            for y in min.y..=max.y {
                for x in min.x..=max.x {
                    job.vm.set_node(V3i::new(x, y, z), n);
                }
            }
        }
    }

    #[test]
    fn pool_edge_is_queued_once() {
        let mut job = job();
        let reg = job.registry.clone();
        let stone = Node::new(reg.id_of("mapgen_stone").unwrap());
        let water = Node::new(reg.id_of("mapgen_water_source").unwrap());
        fill(&mut job, V3i::ZERO, V3i::splat(15), stone);
        fill(&mut job, V3i::new(0, 11, 0), V3i::new(15, 15, 15), Node::AIR);
        // a pool of water with an air channel on its +x side
        fill(&mut job, V3i::new(4, 8, 4), V3i::new(6, 10, 6), water);
        fill(&mut job, V3i::new(7, 10, 4), V3i::new(7, 10, 6), Node::AIR);

        update_liquid(&mut job, V3i::ZERO, V3i::splat(15));
        let q = &job.transforming_liquid;
        assert!(q.contains(V3i::new(6, 10, 5)));
        assert!(!q.contains(V3i::new(5, 10, 5)));
        assert!(!q.contains(V3i::new(4, 10, 5)));
        let before = q.len();
        update_liquid(&mut job, V3i::ZERO, V3i::splat(15));
        assert_eq!(job.transforming_liquid.len(), before);
    }

    #[test]
    fn liquid_over_air_queues_column_bottom() {
        let mut job = job();
        let reg = job.registry.clone();
        let water = Node::new(reg.id_of("mapgen_water_source").unwrap());
        fill(&mut job, V3i::ZERO, V3i::splat(15), Node::AIR);
        fill(&mut job, V3i::new(5, 6, 5), V3i::new(5, 9, 5), water);
        update_liquid(&mut job, V3i::ZERO, V3i::splat(15));
        assert!(job.transforming_liquid.contains(V3i::new(5, 9, 5)));
        assert!(job.transforming_liquid.contains(V3i::new(5, 6, 5)));
    }
}
