use proptest::prelude::*;
use strata_geom::{BlockPos, MAP_BLOCKSIZE, V3i, Vec3};

fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn coord() -> impl Strategy<Value = i32> {
    -30_000i32..=30_000
}

#[test]
fn vec3_add_sub_scale() {
    let a = Vec3::new(1.0, 2.0, 3.0);
    let b = Vec3::new(-4.0, 5.0, -6.0);
    let c = a + b;
    assert!(approx_eq(c.x, -3.0, 1e-6) && approx_eq(c.y, 7.0, 1e-6) && approx_eq(c.z, -3.0, 1e-6));
    let d = (c - a) * 2.0;
    assert!(approx_eq(d.x, -8.0, 1e-6) && approx_eq(d.z, -12.0, 1e-6));
    assert!(approx_eq(Vec3::new(3.0, 4.0, 0.0).length(), 5.0, 1e-6));
}

#[test]
fn v3i_division_truncates_and_div_floor_floors() {
    let p = V3i::new(-17, 17, -1);
    assert_eq!(p / 16, V3i::new(-1, 1, 0));
    assert_eq!(p.div_floor(16), V3i::new(-2, 1, -1));
}

#[test]
fn chunk_origin_is_offset_by_half_chunk() {
    // With chunksize 5 the chunk containing block 0 spans blocks -2..=2.
    let c = BlockPos::new(0, 0, 0).containing_chunk(5);
    assert_eq!(c, BlockPos::new(-2, -2, -2));
    assert_eq!(BlockPos::new(2, 2, 2).containing_chunk(5), c);
    assert_eq!(BlockPos::new(3, -3, 0).containing_chunk(5), BlockPos::new(3, -7, -2));
}

#[test]
fn block_over_limit() {
    assert!(!BlockPos::new(0, 0, 0).over_limit());
    assert!(BlockPos::new(2000, 0, 0).over_limit());
    assert!(BlockPos::new(0, -2000, 0).over_limit());
}

proptest! {
    // Every node maps to the block whose node range contains it
    #[test]
    fn containing_block_contains_node(x in coord(), y in coord(), z in coord()) {
        let p = V3i::new(x, y, z);
        let b = BlockPos::containing(p);
        let lo = b.node_min();
        let hi = b.node_max();
        prop_assert!(lo.x <= p.x && p.x <= hi.x);
        prop_assert!(lo.y <= p.y && p.y <= hi.y);
        prop_assert!(lo.z <= p.z && p.z <= hi.z);
        prop_assert_eq!(hi - lo, V3i::splat(MAP_BLOCKSIZE - 1));
    }

    // Every block of a chunk reports the same chunk origin
    #[test]
    fn containing_chunk_is_stable(x in -1000i32..1000, y in -1000i32..1000, z in -1000i32..1000, cs in 1i32..=8) {
        let c = BlockPos::new(x, y, z).containing_chunk(cs);
        prop_assert!(c.x <= x && x < c.x + cs);
        prop_assert!(c.y <= y && y < c.y + cs);
        prop_assert!(c.z <= z && z < c.z + cs);
        for dx in 0..cs {
            prop_assert_eq!(c.offset(dx, cs - 1, 0).containing_chunk(cs), c);
        }
    }
}
