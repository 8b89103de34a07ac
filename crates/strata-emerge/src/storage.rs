use std::sync::Mutex;

use hashbrown::HashMap;
use strata_geom::{BlockPos, MAP_BLOCKSIZE, V3i};
use strata_nodes::Node;
use strata_voxel::{VoxelArea, VoxelBuffer};

/// Faults of the block store. Any of them stops the emerge service.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("block {pos:?} is corrupt: {reason}")]
    Corrupt { pos: BlockPos, reason: String },
    #[error("block {pos:?} has unsupported format version {version}")]
    VersionMismatch { pos: BlockPos, version: u8 },
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// The nodes of one map block in z, y, x order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapBlock {
    pub pos: BlockPos,
    pub nodes: Vec<Node>,
}

pub type StoredBlock = MapBlock;

impl MapBlock {
    pub const VOLUME: usize = (MAP_BLOCKSIZE * MAP_BLOCKSIZE * MAP_BLOCKSIZE) as usize;

    pub fn area(pos: BlockPos) -> VoxelArea {
        VoxelArea::new(pos.node_min(), pos.node_max())
    }

    /// Copies block `pos` out of `vm`; cells the buffer does not know stay `ignore`.
    pub fn from_buffer(vm: &VoxelBuffer, pos: BlockPos) -> Self {
        let area = Self::area(pos);
        let mut nodes = vec![Node::IGNORE; Self::VOLUME];
        vm.copy_to(&mut nodes, &area, area.min, area.min, V3i::splat(MAP_BLOCKSIZE));
        Self { pos, nodes }
    }

    /// Blits the block into `vm`, which must contain it.
    pub fn copy_into(&self, vm: &mut VoxelBuffer) {
        let area = Self::area(self.pos);
        vm.copy_from(&self.nodes, &area, area.min, area.min, V3i::splat(MAP_BLOCKSIZE));
    }

    pub fn get(&self, p: V3i) -> Node {
        self.nodes[Self::area(self.pos).index(p)]
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockSource {
    Memory,
    Disk,
}

#[derive(Clone, Debug)]
pub struct LoadedBlock {
    pub block: MapBlock,
    pub source: BlockSource,
}

/// Where generated blocks are kept and looked up.
///
/// Called from several worker threads at once.
pub trait Storage: Send + Sync {
    fn try_load(&self, pos: BlockPos) -> Result<Option<LoadedBlock>, StorageError>;

    fn save(&self, pos: BlockPos, block: StoredBlock) -> Result<(), StorageError>;
}

/// Blocks in a hash map behind a mutex.
#[derive(Default)]
pub struct MemoryStorage {
    blocks: Mutex<HashMap<BlockPos, MapBlock>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.lock().expect("storage mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        self.blocks.lock().expect("storage mutex poisoned").contains_key(&pos)
    }
}

impl Storage for MemoryStorage {
    fn try_load(&self, pos: BlockPos) -> Result<Option<LoadedBlock>, StorageError> {
        let blocks = self.blocks.lock().expect("storage mutex poisoned");
        Ok(blocks.get(&pos).map(|b| LoadedBlock {
            block: b.clone(),
            source: BlockSource::Memory,
        }))
    }

    fn save(&self, pos: BlockPos, block: StoredBlock) -> Result<(), StorageError> {
        if block.nodes.len() != MapBlock::VOLUME {
            return Err(StorageError::Corrupt {
                pos,
                reason: format!("{} nodes instead of {}", block.nodes.len(), MapBlock::VOLUME),
            });
        }
        self.blocks.lock().expect("storage mutex poisoned").insert(pos, block);
        Ok(())
    }
}
