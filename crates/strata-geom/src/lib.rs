//! Integer and float vector types shared by the world-generation crates.
#![forbid(unsafe_code)]

use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Edge length of a map block in nodes.
pub const MAP_BLOCKSIZE: i32 = 16;

/// Nodes beyond this distance from the origin on any axis are never generated.
pub const MAX_MAP_GENERATION_LIMIT: i32 = 31_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(self, rhs: Vec3) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Truncates each component toward zero.
    #[inline]
    pub fn to_v3i(self) -> V3i {
        V3i::new(self.x as i32, self.y as i32, self.z as i32)
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(v: [f32; 3]) -> Self {
        Vec3::new(v[0], v[1], v[2])
    }
}

impl From<Vec3> for [f32; 3] {
    fn from(v: Vec3) -> Self {
        [v.x, v.y, v.z]
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vec3) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn div(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

/// Integer node position (or any integer triple: extents, offsets, directions).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct V3i {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl V3i {
    pub const ZERO: V3i = V3i { x: 0, y: 0, z: 0 };
    pub const ONE: V3i = V3i { x: 1, y: 1, z: 1 };

    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn splat(v: i32) -> Self {
        Self { x: v, y: v, z: v }
    }

    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }

    #[inline]
    pub fn min(self, o: V3i) -> V3i {
        V3i::new(self.x.min(o.x), self.y.min(o.y), self.z.min(o.z))
    }

    #[inline]
    pub fn max(self, o: V3i) -> V3i {
        V3i::new(self.x.max(o.x), self.y.max(o.y), self.z.max(o.z))
    }

    /// Floor division per component; used to find the block containing a node.
    #[inline]
    pub fn div_floor(self, d: i32) -> V3i {
        V3i::new(
            self.x.div_euclid(d),
            self.y.div_euclid(d),
            self.z.div_euclid(d),
        )
    }

    #[inline]
    pub fn manhattan(self) -> i64 {
        i64::from(self.x).abs() + i64::from(self.y).abs() + i64::from(self.z).abs()
    }
}

impl Add for V3i {
    type Output = V3i;
    #[inline]
    fn add(self, rhs: V3i) -> V3i {
        V3i::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for V3i {
    #[inline]
    fn add_assign(&mut self, rhs: V3i) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for V3i {
    type Output = V3i;
    #[inline]
    fn sub(self, rhs: V3i) -> V3i {
        V3i::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for V3i {
    #[inline]
    fn sub_assign(&mut self, rhs: V3i) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl Mul<i32> for V3i {
    type Output = V3i;
    #[inline]
    fn mul(self, rhs: i32) -> V3i {
        V3i::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Truncating division, matching integer division semantics.
impl Div<i32> for V3i {
    type Output = V3i;
    #[inline]
    fn div(self, rhs: i32) -> V3i {
        V3i::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for V3i {
    type Output = V3i;
    #[inline]
    fn neg(self) -> V3i {
        V3i::new(-self.x, -self.y, -self.z)
    }
}

impl From<(i32, i32, i32)> for V3i {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

/// Position of a map block (a `MAP_BLOCKSIZE`³ cube of nodes).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    #[inline]
    pub fn distance_sq(self, other: BlockPos) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        let dz = i64::from(self.z - other.z);
        dx * dx + dy * dy + dz * dz
    }

    #[inline]
    pub fn as_v3i(self) -> V3i {
        V3i::new(self.x, self.y, self.z)
    }

    #[inline]
    pub fn from_v3i(v: V3i) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    /// Block that contains node `p`.
    #[inline]
    pub fn containing(p: V3i) -> Self {
        Self::from_v3i(p.div_floor(MAP_BLOCKSIZE))
    }

    #[inline]
    pub fn node_min(self) -> V3i {
        self.as_v3i() * MAP_BLOCKSIZE
    }

    #[inline]
    pub fn node_max(self) -> V3i {
        self.node_min() + V3i::splat(MAP_BLOCKSIZE - 1)
    }

    /// First block of the mapchunk containing this block. Mapchunks are
    /// offset by `-chunksize / 2` blocks so the origin block sits near the
    /// middle of its chunk.
    pub fn containing_chunk(self, chunksize: i32) -> BlockPos {
        let coff = -chunksize / 2;
        let rel = self.as_v3i() - V3i::splat(coff);
        BlockPos::from_v3i(rel.div_floor(chunksize) * chunksize + V3i::splat(coff))
    }

    /// True when any node of this block lies beyond the generation limit.
    pub fn over_limit(self) -> bool {
        let lo = self.node_min();
        let hi = self.node_max();
        let lim = MAX_MAP_GENERATION_LIMIT;
        lo.x < -lim || lo.y < -lim || lo.z < -lim || hi.x > lim || hi.y > lim || hi.z > lim
    }
}

impl From<(i32, i32, i32)> for BlockPos {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

impl From<BlockPos> for (i32, i32, i32) {
    fn from(value: BlockPos) -> Self {
        (value.x, value.y, value.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn block_pos_tuple_roundtrip(p in any::<BlockPos>()) {
            let t: (i32, i32, i32) = p.into();
            prop_assert_eq!(BlockPos::from(t), p);
        }

        #[test]
        fn vec3_truncation_matches_cast(v in any::<Vec3>()) {
            prop_assume!(v.x.is_finite() && v.y.is_finite() && v.z.is_finite());
            prop_assume!(v.x.abs() < 1e6 && v.y.abs() < 1e6 && v.z.abs() < 1e6);
            let t = v.to_v3i();
            prop_assert_eq!(t.x, v.x as i32);
            prop_assert_eq!(t.y, v.y as i32);
            prop_assert_eq!(t.z, v.z as i32);
        }
    }
}
