use strata_geom::{MAX_MAP_GENERATION_LIMIT, V3i};
use strata_nodes::NodeRegistry;
use strata_voxel::VoxelBuffer;

use crate::job::GenerationJob;

/// Highest walkable node of column (`x`, `z`) within `ymin..=ymax`, or
/// `-MAX_MAP_GENERATION_LIMIT` when the column holds none.
pub fn find_ground_level(vm: &VoxelBuffer, reg: &NodeRegistry, x: i32, z: i32, ymin: i32, ymax: i32) -> i32 {
    let area = vm.area();
    let stride = area.y_stride();
    let mut i = area.index(V3i::new(x, ymax, z));
    for y in (ymin..=ymax).rev() {
        if reg.features_of(vm.node_at(i).content).walkable {
            return y;
        }
        if y > ymin {
            i -= stride;
        }
    }
    -MAX_MAP_GENERATION_LIMIT
}

/// Highest liquid node of the column above any walkable node, or
/// `-MAX_MAP_GENERATION_LIMIT` when ground comes first or nothing is found.
pub fn find_liquid_surface(vm: &VoxelBuffer, reg: &NodeRegistry, x: i32, z: i32, ymin: i32, ymax: i32) -> i32 {
    let area = vm.area();
    let stride = area.y_stride();
    let mut i = area.index(V3i::new(x, ymax, z));
    for y in (ymin..=ymax).rev() {
        let f = reg.features_of(vm.node_at(i).content);
        if f.walkable {
            break;
        }
        if f.is_liquid() {
            return y;
        }
        if y > ymin {
            i -= stride;
        }
    }
    -MAX_MAP_GENERATION_LIMIT
}

/// Recomputes `job.heightmap` from the buffer contents over the chunk columns.
pub fn update_heightmap(job: &mut GenerationJob, nmin: V3i, nmax: V3i) {
    let reg = job.registry.clone();
    let mut index = 0usize;
    for z in nmin.z..=nmax.z {
        for x in nmin.x..=nmax.x {
            job.heightmap[index] = find_ground_level(&job.vm, &reg, x, z, nmin.y, nmax.y);
            index += 1;
        }
    }
}

/// Walkable/non-walkable transitions of a column scanned downwards from `ymax`.
///
/// `floors` get the y of each walkable node with open space above, `ceilings` the y of
/// each open node with a walkable node above.
pub fn get_surfaces(
    vm: &VoxelBuffer,
    reg: &NodeRegistry,
    x: i32,
    z: i32,
    ymin: i32,
    ymax: i32,
    floors: &mut Vec<i32>,
    ceilings: &mut Vec<i32>,
) {
    let mut walkable_above = reg.features_of(vm.get_node(V3i::new(x, ymax, z)).content).walkable;
    for y in (ymin..ymax).rev() {
        let walkable = reg.features_of(vm.get_node(V3i::new(x, y, z)).content).walkable;
        if walkable && !walkable_above {
            floors.push(y);
        } else if !walkable && walkable_above {
            ceilings.push(y + 1);
        }
        walkable_above = walkable;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_nodes::Node;
    use strata_voxel::VoxelArea;

    fn column(reg: &NodeRegistry, cells: &[(&str, i32, i32)]) -> VoxelBuffer {
        let mut vm = VoxelBuffer::with_area(VoxelArea::new(V3i::new(0, -10, 0), V3i::new(0, 20, 0)));
        for &(name, y0, y1) in cells {
            let id = reg.id_of(name).unwrap();
            for y in y0..=y1 {
                vm.set_node(V3i::new(0, y, 0), Node::new(id));
            }
        }
        vm
    }

    #[test]
    fn ground_and_liquid_levels() {
        let reg = NodeRegistry::mapgen_defaults().unwrap();
        let vm = column(
            &reg,
            &[("mapgen_stone", -10, 2), ("mapgen_water_source", 3, 6), ("air", 7, 20)],
        );
        assert_eq!(find_ground_level(&vm, &reg, 0, 0, -10, 20), 2);
        assert_eq!(find_liquid_surface(&vm, &reg, 0, 0, -10, 20), 6);
        // ground found first
        assert_eq!(find_liquid_surface(&vm, &reg, 0, 0, -10, 2), -MAX_MAP_GENERATION_LIMIT);
        // nothing walkable
        assert_eq!(find_ground_level(&vm, &reg, 0, 0, 3, 20), -MAX_MAP_GENERATION_LIMIT);
    }

    #[test]
    fn surfaces_of_an_overhang() {
        let reg = NodeRegistry::mapgen_defaults().unwrap();
        let vm = column(
            &reg,
            &[("mapgen_stone", -10, 0), ("air", 1, 4), ("mapgen_stone", 5, 8), ("air", 9, 20)],
        );
        let (mut floors, mut ceilings) = (Vec::new(), Vec::new());
        get_surfaces(&vm, &reg, 0, 0, -10, 20, &mut floors, &mut ceilings);
        assert_eq!(floors, vec![8, 0]);
        assert_eq!(ceilings, vec![5]);
    }
}
