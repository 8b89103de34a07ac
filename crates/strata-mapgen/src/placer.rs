use strata_geom::V3i;

use crate::job::GenerationJob;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PlacementOutcome {
    pub nodes_placed: usize,
}

impl PlacementOutcome {
    pub const NONE: PlacementOutcome = PlacementOutcome { nodes_placed: 0 };
}

/// Decoration, ore or schematic pass run over a finished chunk.
///
/// Placers may write anywhere in the job's buffer. One that changes content affecting
/// light must set `job.lighting_dirty` so the chunk is relit afterwards.
pub trait Placer: Send + Sync {
    fn name(&self) -> &str;

    fn place(&self, job: &mut GenerationJob, blockseed: u32, node_min: V3i, node_max: V3i) -> PlacementOutcome;
}
