use std::collections::HashMap;

use strata_geom::V3i;
use strata_nodes::{CONTENT_AIR, CONTENT_IGNORE, Node};

use super::area::VoxelArea;
use super::direction::Direction;

/// Cell has never been written or loaded.
pub const FLAG_NO_DATA: u8 = 1;
pub const FLAG_CHECKED1: u8 = 1 << 1;
pub const FLAG_CHECKED2: u8 = 1 << 2;
pub const FLAG_CHECKED3: u8 = 1 << 3;
pub const FLAG_CHECKED4: u8 = 1 << 4;

/// Nodes over a [`VoxelArea`] plus a parallel flag byte per cell.
///
/// Owned by exactly one generation job at a time. Accessors taking a position panic
/// when the position lies outside the area; use [`VoxelBuffer::get_node_or_ignore`]
/// for reads that may fall off the edge.
#[derive(Clone, Debug, Default)]
pub struct VoxelBuffer {
    area: VoxelArea,
    nodes: Vec<Node>,
    flags: Vec<u8>,
}

impl VoxelBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer covering `area` with every cell `ignore` and flagged `NO_DATA`.
    pub fn with_area(area: VoxelArea) -> Self {
        let mut b = Self::new();
        b.add_area(&area);
        b
    }

    #[inline]
    pub fn area(&self) -> &VoxelArea {
        &self.area
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    #[inline]
    pub fn flags(&self) -> &[u8] {
        &self.flags
    }

    #[inline]
    pub fn flags_mut(&mut self) -> &mut [u8] {
        &mut self.flags
    }

    /// Nodes and flags borrowed together for passes that update both.
    #[inline]
    pub fn split_mut(&mut self) -> (&VoxelArea, &mut [Node], &mut [u8]) {
        (&self.area, &mut self.nodes, &mut self.flags)
    }

    pub fn clear(&mut self) {
        self.area = VoxelArea::empty();
        self.nodes.clear();
        self.flags.clear();
    }

    /// Grows the buffer to cover `a` as well. Existing cells keep their contents;
    /// new cells read as `ignore` with `NO_DATA` set.
    pub fn add_area(&mut self, a: &VoxelArea) {
        if a.is_empty() || self.area.contains_area(a) {
            return;
        }
        let mut new_area = self.area;
        new_area.add_area(a);
        let volume = new_area.volume();
        let mut nodes = vec![Node::IGNORE; volume];
        let mut flags = vec![FLAG_NO_DATA; volume];

        if !self.area.is_empty() {
            let ex = self.area.extent().x as usize;
            for z in self.area.min.z..=self.area.max.z {
                for y in self.area.min.y..=self.area.max.y {
                    let row = V3i::new(self.area.min.x, y, z);
                    let src = self.area.index(row);
                    let dst = new_area.index(row);
                    nodes[dst..dst + ex].copy_from_slice(&self.nodes[src..src + ex]);
                    flags[dst..dst + ex].copy_from_slice(&self.flags[src..src + ex]);
                }
            }
        }

        self.area = new_area;
        self.nodes = nodes;
        self.flags = flags;
    }

    /// Index of `p`; panics when `p` is outside the area.
    #[inline]
    pub fn index_of(&self, p: V3i) -> usize {
        assert!(
            self.area.contains(p),
            "voxel access at {:?} outside area {:?}..{:?}",
            p,
            self.area.min,
            self.area.max
        );
        self.area.index(p)
    }

    #[inline]
    pub fn try_index(&self, p: V3i) -> Option<usize> {
        self.area.index_of(p)
    }

    /// Index of the cell next to `p` in `dir`, if it lies inside the area.
    #[inline]
    pub fn neighbor(&self, p: V3i, dir: Direction) -> Option<usize> {
        self.area.index_of(p + dir.offset())
    }

    #[inline]
    pub fn get_node(&self, p: V3i) -> Node {
        self.nodes[self.index_of(p)]
    }

    #[inline]
    pub fn set_node(&mut self, p: V3i, n: Node) {
        let i = self.index_of(p);
        self.nodes[i] = n;
        self.flags[i] &= !FLAG_NO_DATA;
    }

    /// `ignore` for cells outside the area or never written.
    #[inline]
    pub fn get_node_or_ignore(&self, p: V3i) -> Node {
        match self.area.index_of(p) {
            Some(i) if self.flags[i] & FLAG_NO_DATA == 0 => self.nodes[i],
            _ => Node::IGNORE,
        }
    }

    #[inline]
    pub fn node_at(&self, i: usize) -> Node {
        self.nodes[i]
    }

    #[inline]
    pub fn set_node_at(&mut self, i: usize, n: Node) {
        self.nodes[i] = n;
        self.flags[i] &= !FLAG_NO_DATA;
    }

    #[inline]
    pub fn flag_at(&self, i: usize) -> u8 {
        self.flags[i]
    }

    /// Clears `mask` on every cell.
    pub fn clear_flag(&mut self, mask: u8) {
        for f in &mut self.flags {
            *f &= !mask;
        }
    }

    /// Sets `mask` on every cell of `a` that lies inside the buffer.
    pub fn set_flags(&mut self, a: &VoxelArea, mask: u8) {
        let a = self.area.intersect(a);
        for p in a.iter() {
            let i = self.area.index(p);
            self.flags[i] |= mask;
        }
    }

    /// Copies a `size` box of `src` (laid out over `src_area`) starting at `from_pos`
    /// into this buffer at `to_pos`. Copied cells lose `NO_DATA`.
    pub fn copy_from(
        &mut self,
        src: &[Node],
        src_area: &VoxelArea,
        from_pos: V3i,
        to_pos: V3i,
        size: V3i,
    ) {
        assert_eq!(src.len(), src_area.volume(), "source slice does not match its area");
        if size.x <= 0 || size.y <= 0 {
            return;
        }
        let run = size.x as usize;
        for z in 0..size.z {
            for y in 0..size.y {
                let s = src_area.index(from_pos + V3i::new(0, y, z));
                let d = self.index_of(to_pos + V3i::new(0, y, z));
                // both rows must fit
                assert!(src_area.contains(from_pos + V3i::new(size.x - 1, y, z)));
                assert!(self.area.contains(to_pos + V3i::new(size.x - 1, y, z)));
                self.nodes[d..d + run].copy_from_slice(&src[s..s + run]);
                for f in &mut self.flags[d..d + run] {
                    *f &= !FLAG_NO_DATA;
                }
            }
        }
    }

    /// Copies a `size` box starting at `from_pos` out into `dst` (laid out over
    /// `dst_area`) at `dst_pos`, leaving destination cells alone where this buffer
    /// holds `ignore`.
    pub fn copy_to(
        &self,
        dst: &mut [Node],
        dst_area: &VoxelArea,
        dst_pos: V3i,
        from_pos: V3i,
        size: V3i,
    ) {
        assert_eq!(dst.len(), dst_area.volume(), "destination slice does not match its area");
        for z in 0..size.z {
            for y in 0..size.y {
                for x in 0..size.x {
                    let off = V3i::new(x, y, z);
                    let n = self.nodes[self.index_of(from_pos + off)];
                    if n.content == CONTENT_IGNORE {
                        continue;
                    }
                    dst[dst_area.index(dst_pos + off)] = n;
                }
            }
        }
    }

    /// One-line summary for logs: bounds, volume, and the most common contents.
    pub fn describe(&self) -> String {
        if self.area.is_empty() {
            return "VoxelBuffer(empty)".to_string();
        }
        let mut counts: HashMap<u16, usize> = HashMap::new();
        let mut no_data = 0usize;
        for (n, f) in self.nodes.iter().zip(&self.flags) {
            *counts.entry(n.content).or_default() += 1;
            if f & FLAG_NO_DATA != 0 {
                no_data += 1;
            }
        }
        let mut top: Vec<(u16, usize)> = counts.into_iter().collect();
        top.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let parts: Vec<String> = top
            .iter()
            .take(4)
            .map(|(c, n)| match *c {
                CONTENT_AIR => format!("air={n}"),
                CONTENT_IGNORE => format!("ignore={n}"),
                c => format!("#{c}={n}"),
            })
            .collect();
        format!(
            "VoxelBuffer({:?}..{:?}, volume={}, no_data={}, {})",
            self.area.min,
            self.area.max,
            self.area.volume(),
            no_data,
            parts.join(" ")
        )
    }
}
