use strata_geom::V3i;

/// Inclusive box of node positions with x-fastest linear indexing.
///
/// An area is empty when any extent component is zero. The default area is the
/// canonical empty box `min = (1,1,1)`, `max = (0,0,0)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct VoxelArea {
    pub min: V3i,
    pub max: V3i,
    extent: V3i,
}

impl Default for VoxelArea {
    fn default() -> Self {
        Self::empty()
    }
}

impl VoxelArea {
    pub const fn empty() -> Self {
        Self {
            min: V3i::ONE,
            max: V3i::ZERO,
            extent: V3i::ZERO,
        }
    }

    pub fn new(min: V3i, max: V3i) -> Self {
        let e = max - min + V3i::ONE;
        Self {
            min,
            max,
            extent: V3i::new(e.x.max(0), e.y.max(0), e.z.max(0)),
        }
    }

    pub fn from_point(p: V3i) -> Self {
        Self::new(p, p)
    }

    #[inline]
    pub fn extent(&self) -> V3i {
        self.extent
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.extent.x == 0 || self.extent.y == 0 || self.extent.z == 0
    }

    #[inline]
    pub fn volume(&self) -> usize {
        self.extent.x as usize * self.extent.y as usize * self.extent.z as usize
    }

    /// Index distance between vertically adjacent cells.
    #[inline]
    pub fn y_stride(&self) -> usize {
        self.extent.x as usize
    }

    /// Index distance between cells adjacent along z.
    #[inline]
    pub fn z_stride(&self) -> usize {
        self.extent.x as usize * self.extent.y as usize
    }

    #[inline]
    pub fn contains(&self, p: V3i) -> bool {
        !self.is_empty()
            && p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Every area contains the empty area.
    pub fn contains_area(&self, a: &VoxelArea) -> bool {
        if a.is_empty() {
            return true;
        }
        self.contains(a.min) && self.contains(a.max)
    }

    #[inline]
    pub fn contains_index(&self, i: usize) -> bool {
        i < self.volume()
    }

    /// Linear index of `p`. The caller guarantees `p` lies inside the area.
    #[inline]
    pub fn index(&self, p: V3i) -> usize {
        debug_assert!(self.contains(p), "{p:?} outside {:?}..{:?}", self.min, self.max);
        let d = p - self.min;
        (d.z as usize * self.extent.y as usize + d.y as usize) * self.extent.x as usize
            + d.x as usize
    }

    #[inline]
    pub fn index_of(&self, p: V3i) -> Option<usize> {
        if self.contains(p) {
            Some(self.index(p))
        } else {
            None
        }
    }

    /// Inverse of [`VoxelArea::index`].
    pub fn position_of(&self, i: usize) -> V3i {
        debug_assert!(self.contains_index(i));
        let ex = self.extent.x as usize;
        let ey = self.extent.y as usize;
        let x = i % ex;
        let y = (i / ex) % ey;
        let z = i / (ex * ey);
        self.min + V3i::new(x as i32, y as i32, z as i32)
    }

    /// Grows to the union with `a`. An empty area is replaced by `a`.
    pub fn add_area(&mut self, a: &VoxelArea) {
        if a.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = *a;
            return;
        }
        *self = VoxelArea::new(self.min.min(a.min), self.max.max(a.max));
    }

    pub fn add_point(&mut self, p: V3i) {
        if self.is_empty() {
            *self = VoxelArea::from_point(p);
            return;
        }
        *self = VoxelArea::new(self.min.min(p), self.max.max(p));
    }

    /// Grows by `d` on every side.
    pub fn pad(&mut self, d: V3i) {
        if self.is_empty() {
            return;
        }
        *self = VoxelArea::new(self.min - d, self.max + d);
    }

    pub fn padded(mut self, d: V3i) -> VoxelArea {
        self.pad(d);
        self
    }

    pub fn intersect(&self, a: &VoxelArea) -> VoxelArea {
        if self.is_empty() || a.is_empty() {
            return VoxelArea::empty();
        }
        let r = VoxelArea::new(self.min.max(a.min), self.max.min(a.max));
        if r.is_empty() { VoxelArea::empty() } else { r }
    }

    /// Disjoint boxes (at most six) covering the cells of `self` outside `a`.
    pub fn diff(&self, a: &VoxelArea) -> Vec<VoxelArea> {
        let a = self.intersect(a);
        if a.is_empty() {
            return if self.is_empty() { Vec::new() } else { vec![*self] };
        }
        let (mn, mx) = (self.min, self.max);
        let candidates = [
            // back slab, full x/y
            VoxelArea::new(V3i::new(mn.x, mn.y, a.max.z + 1), mx),
            // front slab, full x/y
            VoxelArea::new(mn, V3i::new(mx.x, mx.y, a.min.z - 1)),
            // top, full x
            VoxelArea::new(
                V3i::new(mn.x, a.max.y + 1, a.min.z),
                V3i::new(mx.x, mx.y, a.max.z),
            ),
            // bottom, full x
            VoxelArea::new(
                V3i::new(mn.x, mn.y, a.min.z),
                V3i::new(mx.x, a.min.y - 1, a.max.z),
            ),
            VoxelArea::new(
                V3i::new(mn.x, a.min.y, a.min.z),
                V3i::new(a.min.x - 1, a.max.y, a.max.z),
            ),
            VoxelArea::new(
                V3i::new(a.max.x + 1, a.min.y, a.min.z),
                V3i::new(mx.x, a.max.y, a.max.z),
            ),
        ];
        candidates.into_iter().filter(|b| !b.is_empty()).collect()
    }

    /// Positions in index order (x fastest, then y, then z).
    pub fn iter(&self) -> impl Iterator<Item = V3i> + '_ {
        let (mn, mx) = (self.min, self.max);
        let empty = self.is_empty();
        (mn.z..=mx.z)
            .filter(move |_| !empty)
            .flat_map(move |z| {
                (mn.y..=mx.y).flat_map(move |y| (mn.x..=mx.x).map(move |x| V3i::new(x, y, z)))
            })
    }
}
