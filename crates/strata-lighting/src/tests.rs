use super::*;
use strata_nodes::{CONTENT_AIR, LightBank};

fn make_test_registry() -> NodeRegistry {
    NodeRegistry::mapgen_defaults().expect("node set")
}

fn id(reg: &NodeRegistry, name: &str) -> u16 {
    reg.id_of(name).expect(name)
}

/// 5x8x5 buffer: stone below y=0, air above; the layer above the region stays unknown.
fn open_field(reg: &NodeRegistry) -> (VoxelBuffer, VoxelArea) {
    let full = VoxelArea::new(V3i::new(0, -2, 0), V3i::new(4, 6, 4));
    let region = VoxelArea::new(V3i::new(0, -2, 0), V3i::new(4, 5, 4));
    let mut vm = VoxelBuffer::with_area(full);
    let stone = id(reg, "mapgen_stone");
    for p in region.iter() {
        let c = if p.y < 0 { stone } else { CONTENT_AIR };
        vm.set_node(p, Node::new(c));
    }
    (vm, region)
}

#[test]
fn open_sky_reaches_the_ground() {
    let reg = make_test_registry();
    let (mut vm, region) = open_field(&reg);
    calc_lighting(&mut vm, &reg, &region, &region, LightingParams::default());
    for p in region.iter() {
        let n = vm.get_node(p);
        if p.y >= 0 {
            assert_eq!(n.light(LightBank::Day), LIGHT_SUN, "{p:?}");
            assert_eq!(n.light(LightBank::Night), 0);
        } else {
            assert_eq!(n.param1, 0, "{p:?}");
        }
    }
}

#[test]
fn roof_shades_and_light_leaks_in_from_the_side() {
    let reg = make_test_registry();
    let (mut vm, region) = open_field(&reg);
    let stone = id(&reg, "mapgen_stone");
    // roof over x in 0..=2 at y=3
    for z in 0..=4 {
        for x in 0..=2 {
            vm.set_node(V3i::new(x, 3, z), Node::new(stone));
        }
    }
    calc_lighting(&mut vm, &reg, &region, &region, LightingParams::default());
    assert_eq!(vm.get_node(V3i::new(3, 1, 2)).light(LightBank::Day), LIGHT_SUN);
    assert_eq!(vm.get_node(V3i::new(2, 1, 2)).light(LightBank::Day), 14);
    assert_eq!(vm.get_node(V3i::new(1, 1, 2)).light(LightBank::Day), 13);
    assert_eq!(vm.get_node(V3i::new(0, 1, 2)).light(LightBank::Day), 12);
    assert_eq!(vm.get_node(V3i::new(0, 4, 2)).light(LightBank::Day), LIGHT_SUN);
}

#[test]
fn emitter_lights_both_banks_in_a_sealed_room() {
    let reg = make_test_registry();
    let stone = id(&reg, "mapgen_stone");
    let lava = id(&reg, "mapgen_lava_source");
    let area = VoxelArea::new(V3i::splat(-3), V3i::splat(3));
    let mut vm = VoxelBuffer::with_area(area);
    for p in area.iter() {
        let inner = p.x.abs() <= 2 && p.y.abs() <= 2 && p.z.abs() <= 2;
        vm.set_node(p, Node::new(if inner { CONTENT_AIR } else { stone }));
    }
    vm.set_node(V3i::ZERO, Node::new(lava));
    let params = LightingParams {
        water_level: 10,
        propagate_shadow: true,
    };
    calc_lighting(&mut vm, &reg, &area, &area, params);
    let src = vm.get_node(V3i::ZERO);
    assert_eq!(src.light(LightBank::Day), 14);
    assert_eq!(src.light(LightBank::Night), 14);
    let near = vm.get_node(V3i::new(1, 0, 0));
    assert_eq!(near.light(LightBank::Day), 13);
    assert_eq!(near.light(LightBank::Night), 13);
    assert_eq!(vm.get_node(V3i::new(2, 2, 2)).light(LightBank::Night), 8);
    assert_eq!(vm.get_node(V3i::new(3, 0, 0)).param1, 0);
}

#[test]
fn unknown_sky_over_underground_region_stays_dark() {
    let reg = make_test_registry();
    let area = VoxelArea::new(V3i::new(0, -40, 0), V3i::new(3, -33, 3));
    let mut vm = VoxelBuffer::with_area(area);
    for p in area.iter() {
        vm.set_node(p, Node::AIR);
    }
    let lit = propagate_sunlight(&mut vm, &reg, &area, LightingParams::default());
    assert_eq!(lit, 0);
}

#[test]
fn known_dark_cell_above_casts_shadow() {
    let reg = make_test_registry();
    let full = VoxelArea::new(V3i::new(0, 0, 0), V3i::new(2, 4, 2));
    let region = VoxelArea::new(V3i::new(0, 0, 0), V3i::new(2, 3, 2));
    let mut vm = VoxelBuffer::with_area(full);
    for p in full.iter() {
        vm.set_node(p, Node::AIR);
    }
    // Above layer is known air without sunlight: everything is in shadow
    let lit = propagate_sunlight(&mut vm, &reg, &region, LightingParams::default());
    assert_eq!(lit, 0);

    // One sunlit cell up there lets its horizontal neighbours through too
    let mut sunny = Node::AIR;
    sunny.param1 = LIGHT_SUN;
    vm.set_node(V3i::new(0, 4, 0), sunny);
    propagate_sunlight(&mut vm, &reg, &region, LightingParams::default());
    assert_eq!(vm.get_node(V3i::new(0, 0, 0)).param1, LIGHT_SUN);
    assert_eq!(vm.get_node(V3i::new(1, 0, 0)).param1, LIGHT_SUN);
    assert_eq!(vm.get_node(V3i::new(2, 0, 2)).param1, 0);

    // Without shadow propagation every column is lit
    let params = LightingParams {
        propagate_shadow: false,
        ..LightingParams::default()
    };
    clear_light(&mut vm, &region);
    propagate_sunlight(&mut vm, &reg, &region, params);
    assert_eq!(vm.get_node(V3i::new(2, 0, 2)).param1, LIGHT_SUN);
}

#[test]
fn water_stops_sunlight_but_carries_light() {
    let reg = make_test_registry();
    let (mut vm, region) = open_field(&reg);
    let water = id(&reg, "mapgen_water_source");
    for z in 0..=4 {
        for x in 0..=4 {
            vm.set_node(V3i::new(x, 0, z), Node::new(water));
            vm.set_node(V3i::new(x, 1, z), Node::new(water));
        }
    }
    calc_lighting(&mut vm, &reg, &region, &region, LightingParams::default());
    assert_eq!(vm.get_node(V3i::new(2, 2, 2)).light(LightBank::Day), LIGHT_SUN);
    assert_eq!(vm.get_node(V3i::new(2, 1, 2)).light(LightBank::Day), 14);
    assert_eq!(vm.get_node(V3i::new(2, 0, 2)).light(LightBank::Day), 13);
}

#[test]
fn set_lighting_skips_unknown_cells() {
    let area = VoxelArea::new(V3i::ZERO, V3i::splat(1));
    let mut vm = VoxelBuffer::with_area(area);
    vm.set_node(V3i::ZERO, Node::AIR);
    set_lighting(&mut vm, &area, 0x77);
    assert_eq!(vm.get_node(V3i::ZERO).param1, 0x77);
    assert_eq!(vm.get_node(V3i::splat(1)).param1, 0);
}
