use std::collections::VecDeque;
use std::sync::Arc;

use hashbrown::HashSet;
use strata_geom::{BlockPos, MAP_BLOCKSIZE, V3i};
use strata_nodes::NodeRegistry;
use strata_noise::block_seed2;
use strata_voxel::{VoxelArea, VoxelBuffer};

use crate::biome::{BIOME_NONE, BiomeId};
use crate::notify::GenNotifier;

/// FIFO of liquid positions that still need a flow update, without duplicates.
#[derive(Clone, Debug, Default)]
pub struct LiquidQueue {
    queue: VecDeque<V3i>,
    queued: HashSet<V3i>,
}

impl LiquidQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when `p` is already queued.
    pub fn push(&mut self, p: V3i) -> bool {
        if !self.queued.insert(p) {
            return false;
        }
        self.queue.push_back(p);
        true
    }

    pub fn pop(&mut self) -> Option<V3i> {
        let p = self.queue.pop_front()?;
        self.queued.remove(&p);
        Some(p)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn contains(&self, p: V3i) -> bool {
        self.queued.contains(&p)
    }

    pub fn iter(&self) -> impl Iterator<Item = &V3i> {
        self.queue.iter()
    }
}

/// Everything one mapchunk generation reads and writes.
///
/// The voxel buffer covers the chunk plus one block of padding on every side. Padding
/// cells hold neighbour data loaded from storage, or `ignore` when nothing is known.
pub struct GenerationJob {
    pub seed: u64,
    pub blockpos_min: BlockPos,
    pub blockpos_max: BlockPos,
    pub blockpos_requested: BlockPos,
    pub vm: VoxelBuffer,
    pub transforming_liquid: LiquidQueue,
    pub notify: GenNotifier,
    pub registry: Arc<NodeRegistry>,
    /// Ground level per column (`x` fastest), filled by the shaper.
    pub heightmap: Vec<i32>,
    /// Biome per column, filled by biome painting.
    pub biomemap: Vec<BiomeId>,
    /// Set by placers that changed content affecting light.
    pub lighting_dirty: bool,
}

impl GenerationJob {
    pub fn new(
        registry: Arc<NodeRegistry>,
        seed: u64,
        blockpos_min: BlockPos,
        blockpos_max: BlockPos,
        blockpos_requested: BlockPos,
    ) -> Self {
        assert!(
            blockpos_min.x <= blockpos_requested.x
                && blockpos_min.y <= blockpos_requested.y
                && blockpos_min.z <= blockpos_requested.z
                && blockpos_requested.x <= blockpos_max.x
                && blockpos_requested.y <= blockpos_max.y
                && blockpos_requested.z <= blockpos_max.z,
            "requested block {blockpos_requested:?} outside {blockpos_min:?}..{blockpos_max:?}"
        );
        let full = VoxelArea::new(
            (blockpos_min.as_v3i() - V3i::ONE) * MAP_BLOCKSIZE,
            (blockpos_max.as_v3i() + V3i::splat(2)) * MAP_BLOCKSIZE - V3i::ONE,
        );
        let columns = {
            let e = blockpos_max.as_v3i() - blockpos_min.as_v3i() + V3i::ONE;
            (e.x * MAP_BLOCKSIZE * e.z * MAP_BLOCKSIZE) as usize
        };
        Self {
            seed,
            blockpos_min,
            blockpos_max,
            blockpos_requested,
            vm: VoxelBuffer::with_area(full),
            transforming_liquid: LiquidQueue::new(),
            notify: GenNotifier::default(),
            registry,
            heightmap: vec![0; columns],
            biomemap: vec![BIOME_NONE; columns],
            lighting_dirty: false,
        }
    }

    /// Job for the whole mapchunk that contains `requested`.
    pub fn for_block(registry: Arc<NodeRegistry>, seed: u64, requested: BlockPos, chunksize: i32) -> Self {
        let min = requested.containing_chunk(chunksize);
        let max = min.offset(chunksize - 1, chunksize - 1, chunksize - 1);
        Self::new(registry, seed, min, max, requested)
    }

    #[inline]
    pub fn node_min(&self) -> V3i {
        self.blockpos_min.node_min()
    }

    #[inline]
    pub fn node_max(&self) -> V3i {
        self.blockpos_max.node_max()
    }

    #[inline]
    pub fn full_node_min(&self) -> V3i {
        self.vm.area().min
    }

    #[inline]
    pub fn full_node_max(&self) -> V3i {
        self.vm.area().max
    }

    /// Node extent of the chunk without padding.
    pub fn chunk_size(&self) -> V3i {
        self.node_max() - self.node_min() + V3i::ONE
    }

    /// Seed for the chunk's carver RNGs.
    pub fn blockseed(&self) -> u32 {
        block_seed2(self.full_node_min(), self.seed)
    }

    /// Blocks of the chunk itself, in z, y, x order.
    pub fn blocks(&self) -> impl Iterator<Item = BlockPos> + '_ {
        let (mn, mx) = (self.blockpos_min, self.blockpos_max);
        (mn.z..=mx.z).flat_map(move |z| {
            (mn.y..=mx.y).flat_map(move |y| (mn.x..=mx.x).map(move |x| BlockPos::new(x, y, z)))
        })
    }

    /// Padding blocks around the chunk.
    pub fn padding_blocks(&self) -> impl Iterator<Item = BlockPos> + '_ {
        let (mn, mx) = (self.blockpos_min.offset(-1, -1, -1), self.blockpos_max.offset(1, 1, 1));
        let (cmn, cmx) = (self.blockpos_min, self.blockpos_max);
        (mn.z..=mx.z).flat_map(move |z| {
            (mn.y..=mx.y).flat_map(move |y| {
                (mn.x..=mx.x).filter_map(move |x| {
                    let inside = x >= cmn.x && x <= cmx.x && y >= cmn.y && y <= cmx.y && z >= cmn.z && z <= cmx.z;
                    (!inside).then_some(BlockPos::new(x, y, z))
                })
            })
        })
    }

    /// Column index of (`x`, `z`) in the heightmap and biomemap.
    #[inline]
    pub fn column_index(&self, x: i32, z: i32) -> usize {
        let nmin = self.node_min();
        let sx = self.chunk_size().x;
        ((z - nmin.z) * sx + (x - nmin.x)) as usize
    }
}
