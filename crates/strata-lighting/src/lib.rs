//! Light for freshly generated voxels: sunlight columns, then breadth-first spreading.
#![forbid(unsafe_code)]

use std::collections::VecDeque;

use strata_geom::V3i;
use strata_nodes::{LIGHT_SUN, Node, NodeRegistry};
use strata_voxel::{Direction, VoxelArea, VoxelBuffer};

#[derive(Copy, Clone, Debug)]
pub struct LightingParams {
    /// Regions whose top lies at or below this level are treated as underground when
    /// nothing is known above them.
    pub water_level: i32,
    /// Known cells above the region that are not sunlit cast shadow.
    pub propagate_shadow: bool,
}

impl Default for LightingParams {
    fn default() -> Self {
        Self {
            water_level: 1,
            propagate_shadow: true,
        }
    }
}

/// Sets `param1` of every known node in `area` to `light`.
pub fn set_lighting(vm: &mut VoxelBuffer, area: &VoxelArea, light: u8) {
    let a = vm.area().intersect(area);
    let (vm_area, nodes, _) = vm.split_mut();
    for p in a.iter() {
        let n = &mut nodes[vm_area.index(p)];
        if !n.is_ignore() {
            n.param1 = light;
        }
    }
}

pub fn clear_light(vm: &mut VoxelBuffer, area: &VoxelArea) {
    set_lighting(vm, area, 0);
}

/// Full lighting pass: clears `sun_area`, lights it from above, then spreads every
/// bank through `spread_area`.
pub fn calc_lighting(
    vm: &mut VoxelBuffer,
    reg: &NodeRegistry,
    sun_area: &VoxelArea,
    spread_area: &VoxelArea,
    params: LightingParams,
) {
    clear_light(vm, sun_area);
    let lit = propagate_sunlight(vm, reg, sun_area, params);
    let spread = spread_light(vm, reg, spread_area);
    log::trace!(
        target: "lighting",
        "lit {:?}..{:?}: {} sunlit cells, {} spread steps",
        sun_area.min,
        sun_area.max,
        lit,
        spread
    );
}

/// Drops `LIGHT_SUN` down each column of `area` until a node stops sunlight.
/// Returns the number of cells set.
pub fn propagate_sunlight(
    vm: &mut VoxelBuffer,
    reg: &NodeRegistry,
    area: &VoxelArea,
    params: LightingParams,
) -> usize {
    let a = vm.area().intersect(area);
    if a.is_empty() {
        return 0;
    }
    let underground = params.water_level >= a.max.y;
    let mut lit = 0usize;
    for z in a.min.z..=a.max.z {
        for x in a.min.x..=a.max.x {
            let above = V3i::new(x, a.max.y + 1, z);
            let top = vm.get_node_or_ignore(above);
            if top.is_ignore() {
                if underground {
                    continue;
                }
            } else if (top.param1 & 0x0f) != LIGHT_SUN
                && params.propagate_shadow
                && !sun_beside(vm, above)
            {
                continue;
            }

            let mut i = vm.index_of(V3i::new(x, a.max.y, z));
            let stride = vm.area().y_stride();
            for _ in (a.min.y..=a.max.y).rev() {
                let n = vm.node_at(i);
                if !reg.features_of(n.content).sunlight_propagates {
                    break;
                }
                vm.nodes_mut()[i].param1 = LIGHT_SUN;
                lit += 1;
                if i < stride {
                    break;
                }
                i -= stride;
            }
        }
    }
    lit
}

/// True when a horizontal neighbour of `p` is known and carries full sunlight.
fn sun_beside(vm: &VoxelBuffer, p: V3i) -> bool {
    Direction::HORIZONTAL.iter().any(|d| {
        let n = vm.get_node_or_ignore(p + d.offset());
        !n.is_ignore() && (n.param1 & 0x0f) == LIGHT_SUN
    })
}

/// Spreads day and night light from every lit or emitting node through `area`,
/// decaying one level per step in each bank. Returns the number of queue pops.
pub fn spread_light(vm: &mut VoxelBuffer, reg: &NodeRegistry, area: &VoxelArea) -> usize {
    let a = vm.area().intersect(area);
    if a.is_empty() {
        return 0;
    }
    let mut queue: VecDeque<(V3i, u8)> = VecDeque::new();

    for p in a.iter() {
        let i = vm.index_of(p);
        let n = vm.node_at(i);
        if n.is_ignore() {
            continue;
        }
        let f = reg.features_of(n.content);
        if !f.light_propagates {
            continue;
        }
        if f.light_source > 0 {
            vm.nodes_mut()[i].param1 = Node::pack_light(f.light_source);
        }
        let light = vm.node_at(i).param1;
        if light != 0 {
            for d in Direction::ALL {
                light_spread(vm, reg, &a, &mut queue, p + d.offset(), light);
            }
        }
    }

    let mut steps = 0usize;
    while let Some((p, light)) = queue.pop_front() {
        steps += 1;
        for d in Direction::ALL {
            light_spread(vm, reg, &a, &mut queue, p + d.offset(), light);
        }
    }
    steps
}

fn light_spread(
    vm: &mut VoxelBuffer,
    reg: &NodeRegistry,
    a: &VoxelArea,
    queue: &mut VecDeque<(V3i, u8)>,
    p: V3i,
    light: u8,
) {
    if light <= 1 || !a.contains(p) {
        return;
    }
    let i = vm.index_of(p);
    let n = vm.node_at(i);

    let mut day = light & 0x0f;
    if day > 0 {
        day -= 0x01;
    }
    let mut night = light & 0xf0;
    if night > 0 {
        night -= 0x10;
    }
    let cur_day = n.param1 & 0x0f;
    let cur_night = n.param1 & 0xf0;
    if (day <= cur_day && night <= cur_night) || !reg.features_of(n.content).light_propagates {
        return;
    }
    let merged = day.max(cur_day) | night.max(cur_night);
    vm.nodes_mut()[i].param1 = merged;
    queue.push_back((p, merged));
}

#[cfg(test)]
mod tests;
